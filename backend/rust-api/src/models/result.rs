use serde::{Deserialize, Serialize};

use crate::error::QuizError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Perfect,
    Good,
    Poor,
}

impl Verdict {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage == 100.0 {
            Verdict::Perfect
        } else if percentage >= 50.0 {
            Verdict::Good
        } else {
            Verdict::Poor
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Perfect => "Perfect score! Congratulations!",
            Verdict::Good => "Good effort, try again for a perfect score.",
            Verdict::Poor => "Better luck next time!",
        }
    }
}

/// Final result of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub verdict: Verdict,
    pub message: String,
}

/// Percentage and verdict for `score` correct answers out of `total`.
pub fn summarize(score: usize, total: usize) -> Result<ResultSummary, QuizError> {
    if total == 0 {
        return Err(QuizError::EmptyQuiz);
    }
    if score > total {
        return Err(QuizError::ScoreExceedsTotal { score, total });
    }

    let percentage = 100.0 * score as f64 / total as f64;
    let verdict = Verdict::from_percentage(percentage);

    Ok(ResultSummary {
        score,
        total,
        percentage,
        verdict,
        message: verdict.message().to_string(),
    })
}
