use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Reasons a question cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,
    #[error("at least 2 options are required, got {0}")]
    TooFewOptions(usize),
    #[error("option '{0}' appears more than once")]
    DuplicateOption(String),
    #[error("correct answer '{0}' is not one of the options")]
    CorrectAnswerNotInOptions(String),
}

/// A single multiple-choice trivia question.
///
/// Fields are private: the only way to build one is [`Question::new`], which
/// guarantees the correct answer is among the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: Option<String>,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();

        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }

        if !options.contains(&correct_answer) {
            return Err(QuestionError::CorrectAnswerNotInOptions(correct_answer));
        }

        Ok(Self {
            prompt,
            options,
            correct_answer,
            explanation: explanation.filter(|text| !text.trim().is_empty()),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Exact, case-sensitive comparison against the correct option text.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Wire shape the generation service must return.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionPayload {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Options")]
    pub options: Vec<String>,
    #[serde(rename = "CorrectAnswer")]
    pub correct_answer: String,
    #[serde(rename = "Explanation")]
    pub explanation: String,
}

impl TryFrom<QuestionPayload> for Question {
    type Error = QuestionError;

    fn try_from(payload: QuestionPayload) -> Result<Self, Self::Error> {
        Question::new(
            payload.question,
            payload.options,
            payload.correct_answer,
            Some(payload.explanation),
        )
    }
}

/// Question as shown to a player: the correct answer is withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub number: usize,
    pub prompt: String,
    pub options: Vec<String>,
}

impl QuestionView {
    pub fn new(number: usize, question: &Question) -> Self {
        Self {
            number,
            prompt: question.prompt().to_string(),
            options: question.options().to_vec(),
        }
    }
}
