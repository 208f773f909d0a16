/// Metrics and telemetry for the guild verifier
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Upstream directory calls by endpoint and outcome
/// - Directory cache hit/miss rates
/// - Aggregation results

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, Gauge, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Upstream Directory Metrics ==========

    /// Upstream directory calls by endpoint and outcome
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_requests_total",
        "Total number of upstream directory requests",
        &["endpoint", "outcome"]
    )
    .unwrap();

    /// Upstream directory latency in seconds
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "upstream_request_duration_seconds",
        "Upstream directory request latencies in seconds",
        &["endpoint"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Cache hits by cache type
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_hits_total",
        "Total number of cache hits",
        &["cache_type"]
    )
    .unwrap();

    /// Cache misses by cache type
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_misses_total",
        "Total number of cache misses",
        &["cache_type"]
    )
    .unwrap();

    // ========== Aggregation Metrics ==========

    /// Signed lookups by outcome
    pub static ref GUILD_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "guild_lookups_total",
        "Total number of signed guild lookups",
        &["outcome"]
    )
    .unwrap();

    /// Communities skipped because their detail or access lookup failed
    pub static ref GUILD_LOOKUP_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "guild_lookup_skipped_total",
        "Total number of communities skipped during aggregation"
    )
    .unwrap();

    /// Result items returned to clients
    pub static ref GUILD_ITEMS_TOTAL: IntCounter = register_int_counter!(
        "guild_items_total",
        "Total number of result items returned"
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();

    static ref STARTED_AT: Instant = Instant::now();
}

/// Mark process start for uptime reporting
pub fn init() {
    lazy_static::initialize(&STARTED_AT);
}

/// Refresh and return the uptime gauge
pub fn update_uptime() -> f64 {
    let uptime = STARTED_AT.elapsed().as_secs_f64();
    UPTIME_SECONDS.set(uptime);
    uptime
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    update_uptime();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record an upstream directory call
pub fn record_upstream_request(endpoint: &str, success: bool, duration: f64) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[endpoint, if success { "success" } else { "failure" }])
        .inc();
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(duration);
}

/// Record a cache access
pub fn record_cache_access(cache_type: &str, hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[cache_type]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[cache_type]).inc();
    }
}

/// Record a completed signed lookup
pub fn record_guild_lookup(outcome: &str, items: usize, skipped: usize) {
    GUILD_LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
    GUILD_ITEMS_TOTAL.inc_by(items as u64);
    GUILD_LOOKUP_SKIPPED_TOTAL.inc_by(skipped as u64);
}
