//! Query pipeline for the store assistant
//!
//! Features:
//! - Text and voice entry points over one stage machine
//! - Per-stage timeouts, no automatic retries
//! - Stage events broadcast for observers
//! - Scratch audio released on every exit path
//! - Artifact retrieval, deletion and retention purge

pub mod events;
pub mod query_pipeline;

pub use events::PipelineEvent;
pub use query_pipeline::{Capabilities, PipelineFailure, QueryPipeline, QueryPipelineConfig};
