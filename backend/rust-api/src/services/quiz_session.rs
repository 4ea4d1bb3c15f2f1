use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, InvalidStateError, QuizError};
use crate::metrics::track_generation;
use crate::models::question::Question;
use crate::models::result::{summarize, ResultSummary};
use crate::services::question_generator::QuestionGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No topic chosen yet.
    Setup,
    /// Fewer questions than requested have been generated.
    Loading,
    Active,
    Completed,
}

/// Outcome of a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// State machine for one player's quiz.
///
/// `score <= submitted_count <= questions.len() <= requested_count` holds
/// after every operation.
#[derive(Debug, Default)]
pub struct QuizSession {
    topic: String,
    requested_count: usize,
    questions: Vec<Question>,
    current_index: usize,
    score: usize,
    submitted_count: usize,
    answered: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose topic and question count. Only valid before the quiz has started.
    pub fn start(&mut self, topic: &str, requested_count: usize) -> Result<(), InvalidStateError> {
        if self.phase() != Phase::Setup {
            return Err(InvalidStateError::AlreadyStarted);
        }
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(InvalidStateError::EmptyTopic);
        }
        if requested_count == 0 {
            return Err(InvalidStateError::ZeroQuestions);
        }

        self.topic = topic.to_string();
        self.requested_count = requested_count;
        Ok(())
    }

    /// Generate questions until `requested_count` exist.
    ///
    /// On failure, already generated questions are kept so a later call resumes
    /// where this one stopped. Returns the number of questions added.
    pub async fn ensure_questions(
        &mut self,
        generator: &dyn QuestionGenerator,
    ) -> Result<usize, QuizError> {
        if self.phase() == Phase::Setup {
            return Err(InvalidStateError::NotStarted.into());
        }

        let mut added = 0;
        while self.questions.len() < self.requested_count {
            let (topic, existing) = (&self.topic, &self.questions);
            // The duplicate check counts as part of the attempt
            let question = track_generation(async {
                let question = generator.generate(topic, existing).await?;
                if existing.iter().any(|q| q.prompt() == question.prompt()) {
                    return Err(GenerationError::DuplicateQuestion(
                        question.prompt().to_string(),
                    ));
                }
                Ok(question)
            })
            .await?;

            self.questions.push(question);
            added += 1;
            tracing::debug!(
                "Question {}/{} ready for topic={}",
                self.questions.len(),
                self.requested_count,
                self.topic
            );
        }

        Ok(added)
    }

    pub fn current_question(&self) -> Result<&Question, InvalidStateError> {
        self.require_active()?;
        Ok(&self.questions[self.current_index])
    }

    /// Check `answer` against the current question. Does not move to the next question.
    pub fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, InvalidStateError> {
        self.require_active()?;
        if self.answered {
            return Err(InvalidStateError::AlreadyAnswered);
        }

        let question = &self.questions[self.current_index];
        let is_correct = question.is_correct(answer);
        let explanation = question.explanation().map(str::to_string);

        if is_correct {
            self.score += 1;
        }
        self.answered = true;

        Ok(AnswerOutcome {
            is_correct,
            explanation,
        })
    }

    /// Move past an answered question.
    pub fn advance(&mut self) -> Result<(), InvalidStateError> {
        self.require_active()?;
        if !self.answered {
            return Err(InvalidStateError::NotAnswered);
        }

        self.submitted_count += 1;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        self.answered = false;
        Ok(())
    }

    /// Discard everything and go back to topic selection.
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    pub fn summary(&self) -> Result<ResultSummary, QuizError> {
        summarize(self.score, self.questions.len())
    }

    pub fn phase(&self) -> Phase {
        if self.requested_count == 0 {
            Phase::Setup
        } else if self.questions.len() < self.requested_count {
            Phase::Loading
        } else if self.submitted_count >= self.questions.len() {
            Phase::Completed
        } else {
            Phase::Active
        }
    }

    /// `(submitted_count, total questions)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.submitted_count, self.questions.len())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted_count
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    fn require_active(&self) -> Result<(), InvalidStateError> {
        match self.phase() {
            Phase::Active => Ok(()),
            Phase::Setup => Err(InvalidStateError::NotStarted),
            Phase::Loading => Err(InvalidStateError::StillLoading {
                generated: self.questions.len(),
                requested: self.requested_count,
            }),
            Phase::Completed => Err(InvalidStateError::Completed),
        }
    }
}
