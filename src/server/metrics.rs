use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

use crate::blend::Recommendation;
use crate::calibration::{ResolutionSource, ResolutionTier};

/// Metric name prefix for all coffee analysis metrics
const PREFIX: &str = "coffee_analysis";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Analysis Metrics
    pub static ref ESTIMATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_estimations_total"), "Composition estimates by resolution tier"),
        &["tier"]
    ).expect("Failed to create estimations_total metric");

    pub static ref CALIBRATION_LOOKUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_calibration_lookups_total"),
            "Calibration resolutions by the source that provided the coefficients"
        ),
        &["source"]
    ).expect("Failed to create calibration_lookups_total metric");

    // Blend Metrics
    pub static ref BLEND_MATCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_blend_matches_total"), "Blend match requests by best recommendation"),
        &["recommendation"]
    ).expect("Failed to create blend_matches_total metric");

    pub static ref BLEND_PROFILES_SKIPPED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_blend_profiles_skipped_total"),
        "Profiles skipped during matching because of a missing or malformed signature"
    ).expect("Failed to create blend_profiles_skipped_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ESTIMATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CALIBRATION_LOOKUPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BLEND_MATCHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BLEND_PROFILES_SKIPPED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

fn tier_label(tier: ResolutionTier) -> &'static str {
    match tier {
        ResolutionTier::InProcess => "in_process",
        ResolutionTier::Persisted => "persisted",
    }
}

pub fn record_estimation(tier: ResolutionTier) {
    ESTIMATIONS_TOTAL.with_label_values(&[tier_label(tier)]).inc();
}

pub fn record_calibration_lookup(source: ResolutionSource) {
    CALIBRATION_LOOKUPS_TOTAL
        .with_label_values(&[source.as_str()])
        .inc();
}

/// Record a match request. `best` is `None` when no profile could be scored.
pub fn record_blend_match(best: Option<Recommendation>, skipped: usize) {
    let label = match best {
        Some(Recommendation::Excellent) => "excellent",
        Some(Recommendation::VeryGood) => "very_good",
        Some(Recommendation::Good) => "good",
        Some(Recommendation::Moderate) => "moderate",
        Some(Recommendation::Weak) => "weak",
        Some(Recommendation::NoMatch) => "no_match",
        None => "none",
    };
    BLEND_MATCHES_TOTAL.with_label_values(&[label]).inc();
    if skipped > 0 {
        BLEND_PROFILES_SKIPPED_TOTAL.inc_by(skipped as f64);
    }
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
