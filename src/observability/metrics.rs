//! Metrics collection and exposition.
//!
//! # Metrics
//! - `connector_requests_total` (counter): forwarded calls by connector, route, upstream status
//! - `connector_request_duration_seconds` (histogram): outbound latency by connector, route
//! - `connector_transport_errors_total` (counter): calls that got no upstream response

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed outbound call.
pub fn record_forward(connector: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "connector_requests_total",
        "connector" => connector.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "connector_request_duration_seconds",
        "connector" => connector.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an outbound call that failed before a response arrived.
pub fn record_transport_error(connector: &str) {
    metrics::counter!(
        "connector_transport_errors_total",
        "connector" => connector.to_string()
    )
    .increment(1);
}
