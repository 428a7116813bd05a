//! Grounded answer generation
//!
//! - No matches: return the configured no-match message, model untouched
//! - Matches: render the prompt, complete, clean the output
//!
//! A model error or an answer that is empty after cleanup is a
//! `Generation` failure. The generator never retries.

use std::sync::Arc;
use std::time::Instant;

use store_assistant_config::constants::generation;
use store_assistant_config::{LlmSettings, PipelineConfig};
use store_assistant_core::{Answer, Error, LanguageModel, ResolvedContext, Result};

use crate::prompt::PromptTemplate;

/// Generator configuration
#[derive(Debug, Clone)]
pub struct AnswerGeneratorConfig {
    /// Completion token cap
    pub max_tokens: usize,
    /// Reply when nothing in the catalog matched
    pub no_match_message: String,
}

impl Default for AnswerGeneratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: generation::MAX_TOKENS,
            no_match_message: generation::NO_MATCH_MESSAGE.to_string(),
        }
    }
}

impl AnswerGeneratorConfig {
    pub fn from_settings(llm: &LlmSettings, pipeline: &PipelineConfig) -> Self {
        Self {
            max_tokens: llm.max_tokens,
            no_match_message: pipeline.no_match_message.clone(),
        }
    }
}

/// Answer generator
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
    config: AnswerGeneratorConfig,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, config: AnswerGeneratorConfig) -> Self {
        Self {
            model,
            template: PromptTemplate::default(),
            config,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Answer `question` from `context`
    pub async fn generate(&self, question: &str, context: &ResolvedContext) -> Result<Answer> {
        if context.is_empty() {
            tracing::debug!(keyword = %context.keyword(), "No catalog match, using fallback answer");
            return Ok(Answer::fallback(self.config.no_match_message.clone()));
        }

        let prompt = self.template.render(question, context.grounding_text());
        let start = Instant::now();

        let raw = self
            .model
            .complete(&prompt, self.config.max_tokens, self.template.stop_sequences())
            .await
            .map_err(|e| match e {
                Error::Generation(_) => e,
                other => Error::Generation(other.to_string()),
            })?;

        let text = self.template.clean_output(&raw);
        if text.is_empty() {
            return Err(Error::Generation("model returned an empty answer".to_string()));
        }

        tracing::debug!(
            model = %self.model.model_name(),
            matches = context.matched_records().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated grounded answer"
        );

        Ok(Answer::generated(text))
    }
}
