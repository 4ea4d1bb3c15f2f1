use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::question::QuestionError;

/// Failure to obtain one question from the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("generation service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("generation service timed out after {0}s")]
    Timeout(u64),

    #[error("generation service rate limit exceeded")]
    RateLimited,

    #[error("generation service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("generation service returned no choices")]
    EmptyReply,

    #[error("generated question duplicates an earlier one: {0}")]
    DuplicateQuestion(String),

    #[error("malformed question payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),
}

impl GenerationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::EmptyTopic => StatusCode::BAD_REQUEST,
            GenerationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GenerationError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// An operation was invoked in a phase that forbids it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    #[error("quiz has not been started")]
    NotStarted,
    #[error("quiz has already been started")]
    AlreadyStarted,
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("question count must be at least 1")]
    ZeroQuestions,
    #[error("questions are still being generated ({generated}/{requested})")]
    StillLoading { generated: usize, requested: usize },
    #[error("quiz is already completed")]
    Completed,
    #[error("quiz is not finished yet ({submitted}/{total} answered)")]
    NotCompleted { submitted: usize, total: usize },
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error("current question has not been answered yet")]
    NotAnswered,
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    #[error("cannot summarize a quiz without questions")]
    EmptyQuiz,

    #[error("score {score} exceeds the {total} questions asked")]
    ScoreExceedsTotal { score: usize, total: usize },
}

/// Error returned by HTTP handlers, rendered as `{"message", "status", "kind"}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Generation {
        error: GenerationError,
        session_id: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn session_not_found(session_id: &str) -> Self {
        ApiError::NotFound(format!("Session {} not found", session_id))
    }

    /// Attach the session id so the client can resume generation.
    pub fn with_session(self, id: impl ToString) -> Self {
        match self {
            ApiError::Generation { error, .. } => ApiError::Generation {
                error,
                session_id: Some(id.to_string()),
            },
            other => other,
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Generation(error) => ApiError::Generation {
                error,
                session_id: None,
            },
            QuizError::InvalidState(state) => {
                tracing::warn!("Rejected operation in invalid state: {}", state);
                ApiError::Conflict(state.to_string())
            }
            err @ (QuizError::EmptyQuiz | QuizError::ScoreExceedsTotal { .. }) => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        QuizError::from(error).into()
    }
}

impl From<InvalidStateError> for ApiError {
    fn from(error: InvalidStateError) -> Self {
        QuizError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, session_id) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message, None),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message, None),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "invalid_state", message, None),
            ApiError::Generation { error, session_id } => {
                tracing::error!("Question generation failed: {}", error);
                (error.status_code(), "generation_failed", error.to_string(), session_id)
            }
        };

        let mut body = serde_json::json!({
            "message": message,
            "status": status.as_u16(),
            "kind": kind,
        });
        if let Some(id) = session_id {
            body["session_id"] = serde_json::Value::String(id);
        }

        (status, Json(body)).into_response()
    }
}
