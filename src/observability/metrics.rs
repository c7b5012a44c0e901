//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sidecar_shutdown_total` (counter): drain sequences by `outcome`
//! - `sidecar_drain_duration_seconds` (histogram): time from start to outcome
//! - `sidecar_wait_total` (counter): waiter results by `result`
//! - `sidecar_active_connections` (gauge): last downstream count read from envoy
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::DrainOutcome;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_shutdown(outcome: DrainOutcome, elapsed: Duration) {
    counter!("sidecar_shutdown_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("sidecar_drain_duration_seconds").record(elapsed.as_secs_f64());
}

/// `result` is an outcome label, `timeout` or `cancelled`.
pub fn record_wait(result: &'static str) {
    counter!("sidecar_wait_total", "result" => result).increment(1);
}

pub fn record_active_connections(count: u64) {
    gauge!("sidecar_active_connections").set(count as f64);
}
