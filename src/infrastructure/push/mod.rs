//! Push subsystem adapters

pub mod memory;

pub use memory::{InMemoryAuthorizer, InMemoryPushRegistry};
