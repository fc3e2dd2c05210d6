//! Prometheus metrics for the ingestion pipeline.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use tracing::error;

/// Metric name prefix for all pipeline metrics
const PREFIX: &str = "pressroom";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Pipeline metrics
    pub static ref SUBMISSIONS_PROCESSED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_submissions_processed_total"),
        "Submissions processed to a cataloged release"
    ).expect("Failed to create submissions_processed_total metric");

    pub static ref SUBMISSIONS_FAILED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_submissions_failed_total"),
        "Submissions that failed with a fatal error"
    ).expect("Failed to create submissions_failed_total metric");

    pub static ref TRACKS_TRANSCODED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_tracks_transcoded_total"),
        "Tracks transcoded with all renditions"
    ).expect("Failed to create tracks_transcoded_total metric");

    pub static ref TRACKS_DEGRADED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_tracks_degraded_total"),
        "Tracks degraded to empty URLs by a per-track failure"
    ).expect("Failed to create tracks_degraded_total metric");

    pub static ref PIPELINE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_pipeline_duration_seconds"),
            "Wall-clock duration of one pipeline invocation"
        )
        .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0])
    ).expect("Failed to create pipeline_duration_seconds metric");

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");
}

/// Register all metrics with the global registry. Call once at startup.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SUBMISSIONS_PROCESSED_TOTAL.clone()),
        Box::new(SUBMISSIONS_FAILED_TOTAL.clone()),
        Box::new(TRACKS_TRANSCODED_TOTAL.clone()),
        Box::new(TRACKS_DEGRADED_TOTAL.clone()),
        Box::new(PIPELINE_DURATION_SECONDS.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
}
