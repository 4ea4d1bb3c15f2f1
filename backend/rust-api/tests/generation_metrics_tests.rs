// Kept as the only test in this binary: it asserts exact deltas on
// process-wide counters.

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

mod common;

use common::{capital_question, send, ScriptedGenerator};
use quizforge_api::metrics::QUESTIONS_GENERATED_TOTAL;

fn generated(status: &str) -> u64 {
    QUESTIONS_GENERATED_TOTAL.with_label_values(&[status]).get()
}

#[tokio::test]
async fn test_each_generation_attempt_is_counted_once() {
    let generator = Arc::new(ScriptedGenerator::with_replies(vec![
        Ok(capital_question(0)),
        Ok(capital_question(0)),
    ]));
    let app = common::create_test_app_with(generator.clone());

    let success_before = generated("success");
    let duplicate_before = generated("duplicate");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/quizzes",
        Some(json!({ "topic": "Geography", "question_count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let success = generated("success") - success_before;
    let duplicate = generated("duplicate") - duplicate_before;
    assert_eq!(generator.calls(), 2);
    assert_eq!(success, 1);
    assert_eq!(duplicate, 1);
    assert_eq!(success + duplicate, generator.calls() as u64);
}
