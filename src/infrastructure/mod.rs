//! Infrastructure layer - adapters behind the domain ports
//!
//! This layer contains:
//! - In-memory push registry and notification authorizer
//! - The loopback telephony provider
//! - The Prometheus exporter

pub mod metrics;
pub mod push;
pub mod telephony;
