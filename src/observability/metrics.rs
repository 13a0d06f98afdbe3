//! Metrics collection and exposition.
//!
//! # Metrics
//! - `host_state` (gauge): 0=NotStarted .. 4=Stopped
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `audit_stamps_total` (counter): hook invocations by operation

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

use crate::lifecycle::state::HostState;

/// Error type for exporter installation.
#[derive(Debug, Error)]
#[error("failed to install metrics exporter on {address}: {source}")]
pub struct MetricsError {
    address: SocketAddr,
    #[source]
    source: metrics_exporter_prometheus::BuildError,
}

/// Install the Prometheus exporter and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(address: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
        .map_err(|source| MetricsError { address, source })?;

    tracing::info!(address = %address, "Metrics exporter listening");
    Ok(())
}

pub fn record_host_state(state: HostState) {
    metrics::gauge!("host_state").set(f64::from(state.as_code()));
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_audit_stamp(operation: &'static str) {
    metrics::counter!("audit_stamps_total", "operation" => operation).increment(1);
}
