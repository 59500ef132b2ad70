//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routemirror_requests_total` (counter): requests by method, status
//! - `routemirror_request_duration_seconds` (histogram): handler latency
//! - `routemirror_not_found_total` (counter): unmatched method/path
//! - `routemirror_validation_failures_total` (counter): by location
//! - `routemirror_rate_limited_total` (counter): rejected requests

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its own HTTP scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    counter!(
        "routemirror_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("routemirror_request_duration_seconds", "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_not_found(method: &str) {
    counter!("routemirror_not_found_total", "method" => method.to_string()).increment(1);
}

/// `location` is `query` or `body`.
pub fn record_validation_failure(location: &'static str) {
    counter!("routemirror_validation_failures_total", "location" => location).increment(1);
}

pub fn record_rate_limited(key: &str) {
    counter!("routemirror_rate_limited_total", "key" => key.to_string()).increment(1);
}
