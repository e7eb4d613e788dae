// Metrics for observability
// Counters and histograms for requests, predictions, training and reports

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use medirisk_predict::{DiseaseType, RiskLevel};
use medirisk_report::ReportKind;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const PREDICTIONS_TOTAL: &str = "predictions_total";
pub const PREDICTION_ERRORS_TOTAL: &str = "prediction_errors_total";
pub const MODEL_TRAINING_DURATION_SECONDS: &str = "model_training_duration_seconds";
pub const REPORTS_GENERATED_TOTAL: &str = "reports_generated_total";

/// Install the Prometheus recorder and describe every series
///
/// Returns `None` when a recorder is already installed in this process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            return None;
        }
    };

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(PREDICTIONS_TOTAL, "Predictions served by disease and risk level");
    describe_counter!(
        PREDICTION_ERRORS_TOTAL,
        "Rejected or failed predictions by disease and reason"
    );
    describe_histogram!(
        MODEL_TRAINING_DURATION_SECONDS,
        "Time spent training each disease model"
    );
    describe_counter!(REPORTS_GENERATED_TOTAL, "PDF reports rendered by kind");

    tracing::info!("Metrics initialized");
    Some(handle)
}

/// Record an HTTP request; `path` is the matched route pattern
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(HTTP_REQUESTS_TOTAL, "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method.to_string(), "path" => path.to_string()).record(duration_secs);
}

pub fn record_prediction(disease: DiseaseType, level: RiskLevel) {
    counter!(PREDICTIONS_TOTAL, "disease" => disease.as_str(), "risk_level" => level.as_str())
        .increment(1);
}

/// `disease` is the raw submitted value, or "unknown" when it does not parse
pub fn record_prediction_error(disease: &str, reason: &str) {
    let disease = disease
        .parse::<DiseaseType>()
        .map(|d| d.as_str())
        .unwrap_or("unknown");
    counter!(PREDICTION_ERRORS_TOTAL, "disease" => disease, "reason" => reason.to_string())
        .increment(1);
}

pub fn record_model_training(disease: DiseaseType, duration_secs: f64) {
    histogram!(MODEL_TRAINING_DURATION_SECONDS, "disease" => disease.as_str())
        .record(duration_secs);
}

pub fn record_report(kind: ReportKind) {
    counter!(REPORTS_GENERATED_TOTAL, "kind" => kind.as_str()).increment(1);
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
