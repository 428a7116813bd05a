//! LLM integration for grounded answers
//!
//! Features:
//! - Multiple backend support (Ollama, OpenAI-compatible completions)
//! - Fixed prompt template embedding question and grounding text
//! - Answer generation with a no-match fallback that skips the model
//! - Configuration-driven backend construction

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod generator;
pub mod prompt;

pub use adapter::LanguageModelAdapter;
pub use backend::{CompletionResult, FinishReason, LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend};
pub use factory::LlmFactory;
pub use generator::{AnswerGenerator, AnswerGeneratorConfig};
pub use prompt::PromptTemplate;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for store_assistant_core::Error {
    fn from(err: LlmError) -> Self {
        store_assistant_core::Error::Generation(err.to_string())
    }
}
