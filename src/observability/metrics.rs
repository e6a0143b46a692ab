//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method, route, status
//! - `relay_request_duration_seconds` (histogram): time to response headers
//! - `relay_redirect_hops_total` (counter): upstream redirects followed
//! - `relay_blocked_total` (counter): allow-list rejections
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("relay_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_redirect_hop() {
    counter!("relay_redirect_hops_total").increment(1);
}

pub fn record_blocked() {
    counter!("relay_blocked_total").increment(1);
}
