//! Transient values that live for a single pipeline invocation

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::catalog::ProductRecord;

/// Store matches for a keyword plus the grounding text built from them
///
/// `grounding_text` is empty exactly when `matched_records` is empty; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedContext {
    keyword: String,
    matched_records: Vec<ProductRecord>,
    grounding_text: String,
    fallback_sentence: Option<String>,
}

impl ResolvedContext {
    /// Context with no matches
    pub fn empty(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }

    /// Build a context from store matches.
    ///
    /// Every record goes through `describe` and the sentences are joined into
    /// the grounding text. `summarize` runs on the first record only.
    pub fn from_matches<D, S>(
        keyword: impl Into<String>,
        records: Vec<ProductRecord>,
        describe: D,
        summarize: S,
    ) -> Self
    where
        D: Fn(&ProductRecord) -> String,
        S: FnOnce(&ProductRecord) -> String,
    {
        let sentences: Vec<String> = records
            .iter()
            .map(describe)
            .filter(|s| !s.trim().is_empty())
            .collect();

        if records.is_empty() || sentences.is_empty() {
            return Self::empty(keyword);
        }

        let fallback_sentence = records.first().map(summarize);

        Self {
            keyword: keyword.into(),
            grounding_text: sentences.join(" "),
            matched_records: records,
            fallback_sentence,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matched_records(&self) -> &[ProductRecord] {
        &self.matched_records
    }

    pub fn grounding_text(&self) -> &str {
        &self.grounding_text
    }

    /// Terse answer built from the first match in store order
    pub fn fallback_sentence(&self) -> Option<&str> {
        self.fallback_sentence.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.matched_records.is_empty()
    }
}

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Written by the language model from grounding text
    Generated,
    /// Canned "no matching product" reply; the model was not called
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Generated => "generated",
            AnswerSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

impl Answer {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Generated,
        }
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Fallback,
        }
    }
}

/// Result of a voice query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAnswer {
    pub transcribed_text: String,
    pub answer_text: String,
    pub answer_source: AnswerSource,
    /// `None` only when synthesis failures are configured to degrade
    pub artifact_id: Option<ArtifactId>,
}
