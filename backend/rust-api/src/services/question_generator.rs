use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::question::{Question, QuestionPayload};

/// Source of new trivia questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce one question on `topic` that differs from every question in `existing`.
    async fn generate(&self, topic: &str, existing: &[Question])
        -> Result<Question, GenerationError>;

    /// Model identifier, reported by the health endpoint.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiQuestionGenerator {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiQuestionGenerator {
    pub fn new(api_key: String, base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            config.generation_timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_secs)
        } else {
            GenerationError::Transport(err)
        }
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(
        &self,
        topic: &str,
        existing: &[Question],
    ) -> Result<Question, GenerationError> {
        if topic.trim().is_empty() {
            return Err(GenerationError::EmptyTopic);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: build_prompt(topic, existing),
            }],
            temperature: 0.7,
        };

        tracing::debug!(
            "Requesting question: url={}, model={}, topic={}, existing={}",
            url,
            self.model,
            topic,
            existing.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyReply)?
            .message
            .content;

        let question = parse_question(&content)?;
        tracing::info!("Generated question for topic={}: {}", topic, question.prompt());
        Ok(question)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Instruction sent to the generation service.
pub fn build_prompt(topic: &str, existing: &[Question]) -> String {
    let history = existing
        .iter()
        .map(|q| format!("Question: {}, Answer: {}", q.prompt(), q.correct_answer()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a unique JSON response for a trivia question about {topic}.
The question must be different from the following already generated questions:
{history}
The format should be as follows:

{{
  "Question": "The actual question text goes here?",
  "Options": ["Option1", "Option2", "Option3", "Option4"],
  "CorrectAnswer": "TheCorrectAnswer",
  "Explanation": "A detailed explanation on why the correct answer is correct."
}}
"#
    )
}

/// Strictly parse the service reply into a validated question.
pub fn parse_question(content: &str) -> Result<Question, GenerationError> {
    let payload: QuestionPayload = serde_json::from_str(content.trim())?;
    Ok(Question::try_from(payload)?)
}
