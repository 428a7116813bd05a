//! Pipeline events

use serde::Serialize;
use store_assistant_core::{AnswerSource, ErrorKind, PipelineStage};
use uuid::Uuid;

/// Progress of one invocation, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Invocation accepted
    Started { request_id: Uuid, voice: bool },
    /// A stage completed
    StageReached {
        request_id: Uuid,
        stage: PipelineStage,
        elapsed_ms: u64,
    },
    /// Terminal failure
    Failed {
        request_id: Uuid,
        stage: PipelineStage,
        kind: ErrorKind,
        reason: String,
    },
    /// Answer delivered
    Completed {
        request_id: Uuid,
        source: AnswerSource,
        elapsed_ms: u64,
    },
}

impl PipelineEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            PipelineEvent::Started { request_id, .. }
            | PipelineEvent::StageReached { request_id, .. }
            | PipelineEvent::Failed { request_id, .. }
            | PipelineEvent::Completed { request_id, .. } => *request_id,
        }
    }
}
