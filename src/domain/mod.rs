//! Domain layer - Core call lifecycle rules
//!
//! This layer contains:
//! - Aggregates: the `Call` and its state machine
//! - Value Objects: identities, tokens, permission states
//! - Ports: interfaces onto the native telephony subsystem, the push
//!   subsystem and the OS notification center
//! - Events: lifecycle notifications and the observer interface

pub mod call;
pub mod invocation;
pub mod push;
pub mod shared;
pub mod telephony;

// Re-export commonly used types
pub use shared::{DomainError, Result};
