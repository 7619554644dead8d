//! Metrics and observability utilities
//!
//! Provides Prometheus-style metrics with latency histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Invoice Intake metrics
pub const METRICS_PREFIX: &str = "invoice_intake";

/// Histogram buckets for request and store latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_invoices_stored_total", METRICS_PREFIX),
        Unit::Count,
        "Total payloads persisted through the raw ingestion route"
    );

    // Auth metrics
    describe_counter!(
        format!("{}_auth_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Requests rejected for a missing or wrong bearer token"
    );

    // Store metrics
    describe_histogram!(
        format!("{}_store_operation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Store operation latency in seconds, connection open and close included"
    );

    describe_counter!(
        format!("{}_store_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Store operations that failed"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a store operation
pub fn record_store_operation(operation: &'static str, duration_secs: f64, success: bool) {
    histogram!(
        format!("{}_store_operation_duration_seconds", METRICS_PREFIX),
        "operation" => operation
    )
    .record(duration_secs);

    if !success {
        counter!(
            format!("{}_store_errors_total", METRICS_PREFIX),
            "operation" => operation
        )
        .increment(1);
    }
}

/// Helper to record a persisted payload
pub fn record_invoice_stored() {
    counter!(format!("{}_invoices_stored_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a rejected bearer token
pub fn record_auth_failure(reason: &'static str) {
    counter!(
        format!("{}_auth_failures_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(1);
}
