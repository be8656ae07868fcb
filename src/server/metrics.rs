use crate::mood::MoodLabel;
use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    core::Collector, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all sketch mood metrics
const PREFIX: &str = "sketch_mood";

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
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Prediction Metrics
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_predictions_total"),
            "Predictions served by mood and classifier"
        ),
        &["mood", "classifier"]
    ).expect("Failed to create predictions_total metric");

    pub static ref PREDICTION_CONFIDENCE: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_prediction_confidence"),
            "Confidence of served predictions"
        )
        .buckets(vec![0.25, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99])
    ).expect("Failed to create prediction_confidence metric");

    pub static ref RATINGS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_ratings_total"),
        "Total ratings submitted"
    ).expect("Failed to create ratings_total metric");

    pub static ref HISTORY_ENTRIES: Gauge = Gauge::new(
        format!("{PREFIX}_history_entries"),
        "Number of stored history entries"
    ).expect("Failed to create history_entries metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");
}

/// Registers every metric with [`REGISTRY`]. Safe to call more than once.
pub fn init_metrics() {
    let collectors: [Box<dyn Collector>; 7] = [
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(PREDICTIONS_TOTAL.clone()),
        Box::new(PREDICTION_CONFIDENCE.clone()),
        Box::new(RATINGS_TOTAL.clone()),
        Box::new(HISTORY_ENTRIES.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];
    for collector in collectors {
        // AlreadyReg when a previous call (or another test) got there first
        let _ = REGISTRY.register(collector);
    }
    tracing::info!("Metrics registered");
}

pub fn init_history_metrics(num_entries: usize) {
    HISTORY_ENTRIES.set(num_entries as f64);
    tracing::info!("History metrics initialized: {} entries", num_entries);
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_prediction(mood: MoodLabel, classifier: &str, confidence: f64) {
    PREDICTIONS_TOTAL
        .with_label_values(&[mood.as_str(), classifier])
        .inc();
    PREDICTION_CONFIDENCE.observe(confidence);
    HISTORY_ENTRIES.inc();
}

pub fn record_rating() {
    RATINGS_TOTAL.inc();
}

pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Collapses request paths into a bounded set of metric labels.
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "index",
        "/history" => "history",
        "/predict" => "predict",
        "/rate" => "rate",
        "/export.csv" => "export",
        "/v1/status" => "status",
        p if p.starts_with("/static/audio/") => "audio",
        p if p.starts_with("/static/") => "static",
        _ => "other",
    }
}

/// Prometheus text exposition of [`REGISTRY`].
pub async fn metrics_handler() -> impl IntoResponse {
    let mut buffer = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", err);
        return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
    }
    (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
}
