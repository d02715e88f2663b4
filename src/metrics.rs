//! Prometheus metrics for upstream latency and request outcomes.
//!
//! This module tracks:
//! - Gemini generateContent latency
//! - Data store request latency per table and operation
//! - Proxied request and failure counts

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Gemini request latency metric name.
pub const METRIC_GENERATE_LATENCY: &str = "generate_latency_ms";
/// Data store request latency metric name.
pub const METRIC_STORE_LATENCY: &str = "store_request_latency_ms";
/// Proxied API requests counter metric name.
pub const METRIC_API_REQUESTS: &str = "api_requests_total";
/// Failed upstream calls counter metric name.
pub const METRIC_UPSTREAM_FAILURES: &str = "upstream_failures_total";

/// Install the Prometheus recorder and register metric descriptions.
/// Call this once at startup; a second install fails.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_GENERATE_LATENCY,
        "Gemini generateContent latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_LATENCY,
        "Data store request latency in milliseconds"
    );
    describe_counter!(
        METRIC_API_REQUESTS,
        "Total number of proxied API requests by route"
    );
    describe_counter!(
        METRIC_UPSTREAM_FAILURES,
        "Total number of failed upstream calls by upstream"
    );

    debug!("Metrics initialized");
}

/// Record Gemini request latency.
pub fn record_generate_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_GENERATE_LATENCY).record(latency_ms);
}

/// Record data store request latency.
pub fn record_store_latency(start: Instant, table: &str, op: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_LATENCY, "table" => table.to_string(), "op" => op).record(latency_ms);
}

/// Increment the request counter for a route.
pub fn inc_api_requests(route: &'static str) {
    counter!(METRIC_API_REQUESTS, "route" => route).increment(1);
}

/// Increment the failure counter for an upstream ("gemini" or "store").
pub fn inc_upstream_failures(upstream: &'static str) {
    counter!(METRIC_UPSTREAM_FAILURES, "upstream" => upstream).increment(1);
}
