//! Ringside - call lifecycle coordination for room-based calling
//!
//! Bridges incoming voice pushes, the native telephony subsystem and OS
//! notification permissions to application observers, keeping one table
//! of active calls.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use application::{CallCoordinator, CoordinatorBuilder, ProviderSink, PushSink};
pub use domain::call::{Call, CallDirection, CallObserver, CallState, EndReason};
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
