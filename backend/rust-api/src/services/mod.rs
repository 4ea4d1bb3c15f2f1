use std::sync::Arc;

use crate::config::Config;
use question_generator::{OpenAiQuestionGenerator, QuestionGenerator};
use session_store::SessionStore;

pub mod question_generator;
pub mod quiz_session;
pub mod session_store;

pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub generator: Arc<dyn QuestionGenerator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let generator = Arc::new(OpenAiQuestionGenerator::from_config(&config));
        tracing::info!(
            "Question generator ready: base_url={}, model={}",
            generator.base_url(),
            config.openai_model
        );
        Self::with_generator(config, generator)
    }

    /// Build state around any generator implementation.
    pub fn with_generator(config: Config, generator: Arc<dyn QuestionGenerator>) -> Self {
        let sessions = SessionStore::new(config.session_ttl_seconds);
        Self {
            config,
            sessions,
            generator,
        }
    }
}
