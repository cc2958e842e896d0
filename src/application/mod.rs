//! Application layer - the call coordinator
//!
//! Orchestrates the call aggregate against the push and telephony ports and
//! fans call events out to observers.

pub mod coordinator;

pub use coordinator::{CallCoordinator, CoordinatorBuilder, ProviderSink, PushSink};
