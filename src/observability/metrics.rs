//! Metrics collection and exposition.
//!
//! # Metrics
//! - `muxd_listener_starts_total` (counter): listener units started, by listener
//! - `muxd_bundle_builds_total` (counter): bundle files written
//! - `muxd_requests_total` (counter): envelope responses, by status
//! - `muxd_shutdown_seconds` (histogram): drain duration

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
