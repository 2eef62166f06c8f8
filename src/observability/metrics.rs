//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): proxied requests by backend, status
//! - `balancer_request_duration_seconds` (histogram): latency distribution
//! - `balancer_no_backend_total` (counter): requests rejected with an empty pool
//! - `balancer_backend_alive` (gauge): 1=alive, 0=down
//! - `balancer_backend_transitions_total` (counter): liveness changes by backend, direction
//!
//! Recording is a no-op until a recorder is installed, so these helpers are
//! safe to call from tests.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record a request that reached a backend (or failed trying).
pub fn record_request(backend: &str, status: u16, start: Instant) {
    counter!(
        "balancer_requests_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("balancer_request_duration_seconds", "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a request rejected because the pool was empty.
pub fn record_no_backend() {
    counter!("balancer_no_backend_total").increment(1);
}

/// Record the outcome of a probe.
pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!("balancer_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}

/// Record a liveness transition.
pub fn record_transition(backend: &str, alive: bool) {
    let to = if alive { "alive" } else { "down" };
    counter!("balancer_backend_transitions_total", "backend" => backend.to_string(), "to" => to)
        .increment(1);
}
