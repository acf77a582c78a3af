//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by relay and response status
//! - `relay_request_duration_seconds` (histogram): handler latency by relay
//!
//! Without an installed recorder every call is a no-op, so handlers record
//! unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one relay invocation.
pub fn record_relay(relay: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "relay" => relay,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("relay_request_duration_seconds", "relay" => relay)
        .record(start.elapsed().as_secs_f64());
}
