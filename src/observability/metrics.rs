//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, upstream attempts, aggregations, cache)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_attempts_total` (counter): upstream sends by outcome
//! - `gateway_aggregations_total` (counter): fan-outs by outcome
//! - `gateway_aggregation_duration_seconds` (histogram): fan-out latency
//! - `gateway_cache_operations_total` (counter): cache calls by op, outcome
//! - `gateway_responses_total` (counter): dashboard answers by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Labels are static strings except method, status and route

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

/// One inbound request, recorded once its response is ready.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let route = route.to_string();
    counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.clone()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(outcome: &'static str) {
    counter!("gateway_upstream_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_aggregation(outcome: &'static str, started: Instant) {
    counter!("gateway_aggregations_total", "outcome" => outcome).increment(1);
    histogram!("gateway_aggregation_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_cache_operation(op: &'static str, outcome: &'static str) {
    counter!("gateway_cache_operations_total", "op" => op, "outcome" => outcome).increment(1);
}

/// Terminal state of a dashboard request (fresh, cached, no_data, unexpected).
pub fn record_dashboard_outcome(outcome: &'static str) {
    counter!("gateway_responses_total", "outcome" => outcome).increment(1);
}
