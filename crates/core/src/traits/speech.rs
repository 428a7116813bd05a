//! Speech processing traits

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

/// Speech-to-Text interface
///
/// Implementations:
/// - `HttpSttBackend` - sidecar transcription service
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(HttpSttBackend::new(config)?);
/// let text = stt.transcribe(&wav_bytes).await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe a complete WAV payload
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;

    /// Transcribe a WAV file on disk
    ///
    /// Engines that read from a path can override this to skip the copy.
    async fn transcribe_file(&self, path: &Path) -> Result<String> {
        let audio = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Transcription(format!("failed to read {}: {}", path.display(), e)))?;
        self.transcribe(&audio).await
    }

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Implementations:
/// - `HttpTtsBackend` - OpenAI-compatible speech endpoint
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text into WAV bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
