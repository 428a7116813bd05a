//! LLM Factory
//!
//! Builds the configured completion backend and wraps it as a core
//! `LanguageModel`.
//!
//! ## Supported Providers
//! - **Ollama**: local models via `/api/generate`
//! - **OpenAI**: any OpenAI-compatible `/completions` endpoint
//!
//! ## Example
//! ```ignore
//! let model = LlmFactory::create(&settings.llm)?;
//! let generator = AnswerGenerator::new(model, AnswerGeneratorConfig::default());
//! ```

use std::sync::Arc;
use std::time::Duration;

use store_assistant_config::{LlmProvider, LlmSettings};
use store_assistant_core::LanguageModel;

use crate::adapter::LanguageModelAdapter;
use crate::backend::{LlmConfig, OllamaBackend, OpenAIBackend};
use crate::LlmError;

/// Factory for language models
pub struct LlmFactory;

impl LlmFactory {
    /// Create a language model from settings
    pub fn create(settings: &LlmSettings) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let config = Self::backend_config(settings)?;

        tracing::info!(
            provider = ?settings.provider,
            model = %config.model,
            endpoint = %config.endpoint,
            "Creating LLM backend"
        );

        let model: Arc<dyn LanguageModel> = match settings.provider {
            LlmProvider::Ollama => Arc::new(LanguageModelAdapter::new(OllamaBackend::new(config)?)),
            LlmProvider::OpenAi => Arc::new(LanguageModelAdapter::new(OpenAIBackend::new(config)?)),
        };
        Ok(model)
    }

    fn backend_config(settings: &LlmSettings) -> Result<LlmConfig, LlmError> {
        if settings.model.trim().is_empty() {
            return Err(LlmError::Configuration("llm.model must not be empty".to_string()));
        }
        if settings.endpoint.trim().is_empty() {
            return Err(LlmError::Configuration("llm.endpoint must not be empty".to_string()));
        }

        Ok(LlmConfig {
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            temperature: settings.temperature,
            timeout: Duration::from_millis(settings.timeout_ms),
            max_retries: settings.max_retries,
            ..LlmConfig::default()
        })
    }
}
