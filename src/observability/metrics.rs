//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_requests_total` (counter): worker invocations by status
//! - `service_request_duration_seconds` (histogram): worker latency
//! - `service_active_connections` (gauge): current connection count
//! - `service_serve_errors_total` (counter): listener-level accept failures
//! - `service_shutdowns_total` (counter): shutdown sequences by outcome
//! - `service_shutdown_duration_seconds` (histogram): signal to stopped
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter runs its own listener outside the lifecycle

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one completed worker invocation.
pub fn record_request(status: u16, start: Instant) {
    counter!("service_requests_total", "status" => status.to_string()).increment(1);
    histogram!("service_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    gauge!("service_active_connections").increment(1.0);
}

pub fn connection_closed() {
    gauge!("service_active_connections").decrement(1.0);
}

pub fn record_serve_error() {
    counter!("service_serve_errors_total").increment(1);
}

/// Record the outcome of a shutdown sequence.
pub fn record_shutdown(outcome: &'static str, elapsed: Duration) {
    counter!("service_shutdowns_total", "outcome" => outcome).increment(1);
    histogram!("service_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}
