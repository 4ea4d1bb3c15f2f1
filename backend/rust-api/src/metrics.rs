use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::GenerationError;

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Generation service
    pub static ref QUESTIONS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "questions_generated_total",
        "Total number of question generation attempts",
        &["status"]
    )
    .unwrap();

    pub static ref QUESTION_GENERATION_DURATION_SECONDS: Histogram = register_histogram!(
        "question_generation_duration_seconds",
        "Question generation call duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref QUIZ_SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_sessions_total",
        "Total number of quiz sessions by lifecycle event",
        &["status"]
    )
    .unwrap();

    pub static ref QUIZ_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "quiz_sessions_active",
        "Number of quiz sessions currently held in memory"
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_submitted_total",
        "Total number of answers submitted",
        &["correct"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: time one generation call and count its outcome
pub async fn track_generation<F, T>(future: F) -> Result<T, GenerationError>
where
    F: std::future::Future<Output = Result<T, GenerationError>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    QUESTION_GENERATION_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

    let status = match &result {
        Ok(_) => "success",
        Err(GenerationError::Timeout(_)) => "timeout",
        Err(GenerationError::RateLimited) => "rate_limited",
        Err(GenerationError::DuplicateQuestion(_)) => "duplicate",
        Err(GenerationError::MalformedPayload(_)) | Err(GenerationError::InvalidQuestion(_)) => {
            "invalid_reply"
        }
        Err(_) => "error",
    };
    QUESTIONS_GENERATED_TOTAL.with_label_values(&[status]).inc();

    result
}

/// Record an evaluated answer
pub fn record_answer(correct: bool) {
    let label = if correct { "true" } else { "false" };
    ANSWERS_SUBMITTED_TOTAL.with_label_values(&[label]).inc();
}
