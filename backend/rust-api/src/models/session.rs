use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::question::QuestionView;
use crate::services::quiz_session::{Phase, QuizSession};

/// Request to start a quiz on a topic
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Topic must be between 1 and 200 characters"
    ))]
    pub topic: String,

    #[validate(range(
        min = 1,
        max = 10,
        message = "Question count must be between 1 and 10"
    ))]
    pub question_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Progress {
    pub submitted: usize,
    pub total: usize,
}

impl From<(usize, usize)> for Progress {
    fn from((submitted, total): (usize, usize)) -> Self {
        Self { submitted, total }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub score: usize,
    pub progress: Progress,
}

/// Snapshot of a quiz session as exposed over HTTP
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub topic: Option<String>,
    pub requested_count: usize,
    pub generated_count: usize,
    pub score: usize,
    pub progress: Progress,
    pub answered: bool,
    pub current_question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionView {
    pub fn new(session_id: Uuid, session: &QuizSession, created_at: Option<DateTime<Utc>>) -> Self {
        let phase = session.phase();
        let topic = match phase {
            Phase::Setup => None,
            _ => Some(session.topic().to_string()),
        };

        Self {
            session_id,
            phase,
            topic,
            requested_count: session.requested_count(),
            generated_count: session.questions().len(),
            score: session.score(),
            progress: session.progress().into(),
            answered: session.is_answered(),
            current_question: session
                .current_question()
                .ok()
                .map(|q| QuestionView::new(session.current_index() + 1, q)),
            created_at,
        }
    }
}
