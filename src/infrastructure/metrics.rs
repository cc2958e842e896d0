//! Prometheus metrics
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the exporter.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid metrics listen address {0}")]
    InvalidListenAddress(String),

    #[error("Failed to install Prometheus exporter: {0}")]
    Install(#[from] BuildError),
}

/// Install the Prometheus exporter, serving scrapes on `listen`.
/// Must be called within a tokio runtime.
pub fn init_metrics(listen: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|_| MetricsError::InvalidListenAddress(listen.to_string()))?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        "ringside_pushes_total",
        "Total number of pushes received, by outcome"
    );
    describe_counter!(
        "ringside_provider_actions_total",
        "Total number of provider actions acknowledged, by action and outcome"
    );
    describe_counter!(
        "ringside_calls_ended_total",
        "Total number of calls concluded by the application, by reason"
    );
    describe_gauge!(
        "ringside_active_calls",
        "Number of calls in the active-call table"
    );

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Record a push and how it was handled
pub fn record_push(outcome: &'static str) {
    counter!("ringside_pushes_total", "outcome" => outcome).increment(1);
}

/// Record a provider action acknowledgement
pub fn record_provider_action(action: &'static str, outcome: &'static str) {
    counter!("ringside_provider_actions_total", "action" => action, "outcome" => outcome)
        .increment(1);
}

/// Record a call concluded through one of the report operations
pub fn record_call_concluded(reason: &'static str) {
    counter!("ringside_calls_ended_total", "reason" => reason).increment(1);
}

/// Update active calls gauge
pub fn update_active_calls(count: usize) {
    gauge!("ringside_active_calls").set(count as f64);
}
