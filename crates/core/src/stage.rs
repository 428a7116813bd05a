//! Query pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of one pipeline invocation
///
/// ```text
/// RECEIVED → (TRANSCRIBING) → KEYWORD_EXTRACTED → CONTEXT_RESOLVED
///          → ANSWER_READY → (SYNTHESIZING) → ARTIFACT_STORED → DONE
/// ```
///
/// Text queries skip the bracketed stages and `ArtifactStored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Received,
    Transcribing,
    KeywordExtracted,
    ContextResolved,
    AnswerReady,
    Synthesizing,
    ArtifactStored,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "RECEIVED",
            PipelineStage::Transcribing => "TRANSCRIBING",
            PipelineStage::KeywordExtracted => "KEYWORD_EXTRACTED",
            PipelineStage::ContextResolved => "CONTEXT_RESOLVED",
            PipelineStage::AnswerReady => "ANSWER_READY",
            PipelineStage::Synthesizing => "SYNTHESIZING",
            PipelineStage::ArtifactStored => "ARTIFACT_STORED",
            PipelineStage::Done => "DONE",
        }
    }

    /// Whether moving from `self` to `next` respects stage order
    pub fn can_advance_to(&self, next: PipelineStage) -> bool {
        next > *self
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
