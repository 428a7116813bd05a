//! Voice input and output plumbing
//!
//! Features:
//! - WAV validation before any model runs
//! - Request-scoped scratch files removed on every exit path
//! - HTTP clients for the transcription and speech sidecars
//! - Adapters that map backend faults onto pipeline error kinds

pub mod adapters;
pub mod scratch;
pub mod stt;
pub mod tts;
pub mod wav;

pub use adapters::{SpeechSynthesisAdapter, TranscriptionAdapter};
pub use scratch::ScratchAudio;
pub use stt::{HttpSttBackend, HttpSttConfig};
pub use tts::{HttpTtsBackend, HttpTtsConfig};
pub use wav::{validate_wav, WavInfo};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for store_assistant_core::Error {
    fn from(err: PipelineError) -> Self {
        use store_assistant_core::Error;
        match err {
            PipelineError::Audio(msg) => Error::InputValidation(msg),
            PipelineError::Stt(msg) => Error::Transcription(msg),
            PipelineError::Tts(msg) => Error::Synthesis(msg),
            PipelineError::Network(msg) => Error::Transcription(msg),
            PipelineError::Io(e) => Error::Transcription(e.to_string()),
        }
    }
}
