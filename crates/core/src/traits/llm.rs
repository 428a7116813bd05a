//! Language model trait

use crate::Result;
use async_trait::async_trait;

/// Generative model interface
///
/// A single stateless completion: no chat history, no tool calls.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Complete `prompt`, producing at most `max_tokens` tokens and stopping
    /// at the first of `stop`
    async fn complete(&self, prompt: &str, max_tokens: usize, stop: &[String]) -> Result<String>;

    /// Check if the model endpoint is reachable
    async fn is_available(&self) -> bool {
        true
    }

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
