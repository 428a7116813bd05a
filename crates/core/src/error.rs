//! Error taxonomy shared by every crate in the workspace
//!
//! Each variant maps to one failure class of the query pipeline. Crate-local
//! errors (`LlmError`, `PersistenceError`, ...) convert into these at the seams
//! so the orchestrator only has to reason about one type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad format, empty or oversized input. Raised before any adapter runs.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Backing data not loaded or unreachable. Distinct from "no match".
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Artifact write failed: {0}")]
    ArtifactWrite(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Stable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputValidation(_) => ErrorKind::InputValidation,
            Error::Transcription(_) => ErrorKind::Transcription,
            Error::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Synthesis(_) => ErrorKind::Synthesis,
            Error::ArtifactWrite(_) => ErrorKind::ArtifactWrite,
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Human-readable reason without the kind prefix
    pub fn reason(&self) -> &str {
        match self {
            Error::InputValidation(r)
            | Error::Transcription(r)
            | Error::StoreUnavailable(r)
            | Error::Generation(r)
            | Error::Synthesis(r)
            | Error::ArtifactWrite(r)
            | Error::NotFound(r) => r,
        }
    }

    /// Build an error of the given kind
    pub fn from_kind(kind: ErrorKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match kind {
            ErrorKind::InputValidation => Error::InputValidation(reason),
            ErrorKind::Transcription => Error::Transcription(reason),
            ErrorKind::StoreUnavailable => Error::StoreUnavailable(reason),
            ErrorKind::Generation => Error::Generation(reason),
            ErrorKind::Synthesis => Error::Synthesis(reason),
            ErrorKind::ArtifactWrite => Error::ArtifactWrite(reason),
            ErrorKind::NotFound => Error::NotFound(reason),
        }
    }
}

/// Error classification, used for status mapping and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputValidation,
    Transcription,
    StoreUnavailable,
    Generation,
    Synthesis,
    ArtifactWrite,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputValidation => "input_validation",
            ErrorKind::Transcription => "transcription",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Generation => "generation",
            ErrorKind::Synthesis => "synthesis",
            ErrorKind::ArtifactWrite => "artifact_write",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
