//! Core traits and types for the store assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Catalog records (product locations, vouchers)
//! - Per-request values (query, resolved context, answer)
//! - Audio artifact identity
//! - Pipeline stages
//! - Error types
//! - Capability traits for pluggable backends (STT, TTS, LLM, store)

pub mod artifact;
pub mod catalog;
pub mod error;
pub mod query;
pub mod stage;
pub mod traits;

pub use artifact::{ArtifactId, AudioArtifact};
pub use catalog::{ProductRecord, VoucherRecord};
pub use error::{Error, ErrorKind, Result};
pub use query::{Answer, AnswerSource, ResolvedContext, VoiceAnswer};
pub use stage::PipelineStage;

// Trait re-exports
pub use traits::{LanguageModel, ProductStore, SpeechToText, TextToSpeech};
