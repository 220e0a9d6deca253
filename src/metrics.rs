//! Lightweight metrics helpers for the gateway.
//!
//! This module exposes a small set of convenience functions and RAII timers
//! wrapping the `metrics` crate macros. It intentionally avoids embedding a
//! concrete exporter (the application can initialize any compatible recorder
//! externally) while still documenting and describing gateway-specific metric
//! names.
//!
//! Provided metrics (labels vary by family):
//! * `gateway_requests_total` (counter)
//! * `gateway_request_duration_seconds` (histogram)
//! * `gateway_auth_failures_total` (counter)
//! * `gateway_upstream_requests_total` (counter)
//! * `gateway_upstream_request_duration_seconds` (histogram)
//!
//! The `*Timer` structs leverage `Drop` to record durations safely even when
//! early returns or errors occur.
use std::time::Instant;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const GATEWAY_REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const GATEWAY_REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";
pub const GATEWAY_AUTH_FAILURES_TOTAL: &str = "gateway_auth_failures_total"; // labels: reason
pub const GATEWAY_UPSTREAM_REQUESTS_TOTAL: &str = "gateway_upstream_requests_total";
pub const GATEWAY_UPSTREAM_REQUEST_DURATION_SECONDS: &str =
    "gateway_upstream_request_duration_seconds";

static DESCRIBED: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        GATEWAY_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests processed by the gateway."
    );
    describe_histogram!(
        GATEWAY_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of HTTP requests processed by the gateway."
    );
    describe_counter!(
        GATEWAY_AUTH_FAILURES_TOTAL,
        Unit::Count,
        "Total number of requests rejected during credential verification."
    );
    describe_counter!(
        GATEWAY_UPSTREAM_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests forwarded to upstream services."
    );
    describe_histogram!(
        GATEWAY_UPSTREAM_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of HTTP requests forwarded to upstream services."
    );
});

/// Increment the total request counter for an inbound gateway request.
pub fn increment_request_total(path: &str, method: &str, status: u16) {
    counter!(
        GATEWAY_REQUESTS_TOTAL,
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a completed inbound request's duration.
pub fn record_request_duration(path: &str, method: &str, duration: std::time::Duration) {
    histogram!(
        GATEWAY_REQUEST_DURATION_SECONDS,
        "path" => path.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Increment the counter of rejected credentials, labelled by rejection
/// reason (`malformed_credential`, `invalid_signature`, `expired`,
/// `schema_violation`).
pub fn increment_auth_failure(reason: &str) {
    counter!(
        GATEWAY_AUTH_FAILURES_TOTAL,
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increment total count of forwarded upstream requests.
pub fn increment_upstream_request_total(upstream: &str, method: &str, status: u16) {
    counter!(
        GATEWAY_UPSTREAM_REQUESTS_TOTAL,
        "upstream" => upstream.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a completed upstream request duration.
pub fn record_upstream_request_duration(
    upstream: &str,
    method: &str,
    duration: std::time::Duration,
) {
    histogram!(
        GATEWAY_UPSTREAM_REQUEST_DURATION_SECONDS,
        "upstream" => upstream.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// RAII helper measuring inbound request duration.
pub struct RequestTimer {
    start: Instant,
    path: String,
    method: String,
}

impl RequestTimer {
    pub fn new(path: &str, method: &str) -> Self {
        Self {
            start: Instant::now(),
            path: path.to_string(),
            method: method.to_string(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        record_request_duration(&self.path, &self.method, self.start.elapsed());
    }
}

/// RAII helper measuring upstream request duration.
pub struct UpstreamRequestTimer {
    start: Instant,
    upstream: String,
    method: String,
}

impl UpstreamRequestTimer {
    pub fn new(upstream: &str, method: &str) -> Self {
        Self {
            start: Instant::now(),
            upstream: upstream.to_string(),
            method: method.to_string(),
        }
    }
}

impl Drop for UpstreamRequestTimer {
    fn drop(&mut self) {
        record_upstream_request_duration(&self.upstream, &self.method, self.start.elapsed());
    }
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing gateway metrics");

    // Force lazy registration of metric descriptions
    Lazy::force(&DESCRIBED);

    tracing::info!("Gateway metrics initialized successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::new("/test", "GET");
        // Timer will record duration when dropped
        drop(timer);
    }

    #[test]
    fn test_upstream_request_timer() {
        let timer = UpstreamRequestTimer::new("http://upstream:8080", "POST");
        // Timer will record duration when dropped
        drop(timer);
    }

    #[test]
    fn test_init_metrics() {
        let result = init_metrics();
        assert!(result.is_ok());
    }
}
