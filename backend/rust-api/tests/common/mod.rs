#![allow(dead_code)]

pub mod mock_openai;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use quizforge_api::{
    config::Config,
    create_router,
    error::GenerationError,
    models::Question,
    services::{question_generator::QuestionGenerator, AppState},
};

/// Generator that replays queued replies and falls back to fresh capital-city questions.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<Question, GenerationError>>>,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    pub fn with_replies(replies: Vec<Result<Question, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _topic: &str,
        existing: &[Question],
    ) -> Result<Question, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => Ok(capital_question(existing.len())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Question number `n`; the correct answer is always "Paris".
pub fn capital_question(n: usize) -> Question {
    Question::new(
        format!("Question {}: what is the capital of France?", n + 1),
        vec![
            "Paris".to_string(),
            "London".to_string(),
            "Berlin".to_string(),
            "Rome".to_string(),
        ],
        "Paris",
        Some("Paris is the capital of France.".to_string()),
    )
    .unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn create_test_app() -> Router {
    create_test_app_with(Arc::new(ScriptedGenerator::new()))
}

pub fn create_test_app_with(generator: Arc<dyn QuestionGenerator>) -> Router {
    init_tracing();
    let config = Config::for_tests("http://127.0.0.1:9");
    create_router(Arc::new(AppState::with_generator(config, generator)))
}

/// App using the real OpenAI client pointed at `base_url`.
pub fn create_openai_app(base_url: &str) -> Router {
    init_tracing();
    create_router(Arc::new(AppState::new(Config::for_tests(base_url))))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, json)
}

/// Create a quiz and return its session id.
pub async fn create_quiz(app: &Router, topic: &str, count: usize) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/quizzes",
        Some(serde_json::json!({ "topic": topic, "question_count": count })),
    )
    .await;
    if status != StatusCode::CREATED {
        panic!("unexpected status {} body {}", status, json);
    }
    json["session_id"].as_str().unwrap().to_string()
}
