//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vt_relay_requests_total` (counter): relayed requests by action, outcome
//! - `vt_relay_request_duration_seconds` (histogram): time spent per request
//! - `vt_relay_malformed_replies_total` (counter): replies forwarded raw
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve Prometheus metrics over HTTP on `addr`. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one relay invocation.
pub fn record_relay(action: &'static str, outcome: &'static str, start: Instant) {
    counter!("vt_relay_requests_total", "action" => action, "outcome" => outcome).increment(1);
    histogram!("vt_relay_request_duration_seconds", "action" => action)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_malformed_reply() {
    counter!("vt_relay_malformed_replies_total").increment(1);
}
