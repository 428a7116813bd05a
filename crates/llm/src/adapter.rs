//! Language Model adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait, allowing
//! LLM backends to be used where LanguageModel is expected.

use async_trait::async_trait;
use std::sync::Arc;

use store_assistant_core::{Error, LanguageModel, Result};

use crate::backend::{FinishReason, LlmBackend};

/// Adapter that wraps an LlmBackend to implement the core LanguageModel trait.
///
/// # Example
///
/// ```ignore
/// let backend = OllamaBackend::new(config)?;
/// let model: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));
/// ```
pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl LanguageModelAdapter {
    /// Create a new adapter wrapping an LlmBackend
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend: Arc::new(backend),
            model_name,
        }
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend, model_name }
    }
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    async fn complete(&self, prompt: &str, max_tokens: usize, stop: &[String]) -> Result<String> {
        let result = self
            .backend
            .complete(prompt, max_tokens, stop)
            .await
            .map_err(|e| Error::Generation(format!("LLM generation failed: {}", e)))?;

        if result.finish_reason == FinishReason::Length {
            tracing::debug!(
                model = %self.model_name,
                max_tokens,
                "Completion hit the token limit"
            );
        }
        tracing::debug!(
            model = %self.model_name,
            tokens = result.tokens,
            elapsed_ms = result.total_time_ms,
            "Completion finished"
        );

        Ok(result.text)
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CompletionResult;
    use crate::LlmError;

    struct FixedBackend(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: usize,
            _stop: &[String],
        ) -> std::result::Result<CompletionResult, LlmError> {
            match self.0 {
                Ok(text) => Ok(CompletionResult {
                    text: text.to_string(),
                    tokens: 3,
                    total_time_ms: 1,
                    finish_reason: FinishReason::Stop,
                }),
                Err(msg) => Err(LlmError::Api(msg.to_string())),
            }
        }

        async fn is_available(&self) -> bool {
            self.0.is_ok()
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_passes_text_through() {
        let model = LanguageModelAdapter::new(FixedBackend(Ok(" Zone 2 ")));
        assert_eq!(model.complete("p", 16, &[]).await.unwrap(), " Zone 2 ");
        assert_eq!(model.model_name(), "fixed");
        assert!(model.is_available().await);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_generation_error() {
        let model = LanguageModelAdapter::new(FixedBackend(Err("model crashed")));
        let err = model.complete("p", 16, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Generation(msg) if msg.contains("model crashed")));
    }
}
