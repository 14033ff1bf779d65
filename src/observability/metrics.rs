//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shield_requests_rejected_total` (counter): rejections by check
//! - `shield_words_filtered_total` (counter): sensitive words replaced
//! - `shield_limiter_evictions_total` (counter): idle entries swept
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic increments)
//! - The Prometheus exporter is optional and bound on its own address

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and HTTP exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "failed to start metrics exporter"),
    }
}

/// Record a request rejected by one of the shield checks.
pub fn record_rejected(check: &'static str, reason: &'static str) {
    metrics::counter!(
        "shield_requests_rejected_total",
        "check" => check,
        "reason" => reason,
    )
    .increment(1);
}

/// Record sensitive words replaced in a payload field.
pub fn record_words_filtered(count: usize) {
    metrics::counter!("shield_words_filtered_total").increment(count as u64);
}

/// Record entries evicted by the limiter sweep.
pub fn record_sweep(evicted: usize) {
    metrics::counter!("shield_limiter_evictions_total").increment(evicted as u64);
}
