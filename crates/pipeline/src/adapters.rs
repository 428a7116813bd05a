//! Trait Adapters
//!
//! Wrap the injected speech capabilities so every fault comes out as the
//! error kind of its stage:
//! - `TranscriptionAdapter` reads the request's scratch file, any failure is
//!   `Transcription`
//! - `SpeechSynthesisAdapter` treats empty output as `Synthesis`
//!
//! Neither keeps state between calls.

use std::path::Path;
use std::sync::Arc;

use store_assistant_core::{Error, Result, SpeechToText, TextToSpeech};

use crate::scratch::ScratchAudio;

// =============================================================================
// Transcription
// =============================================================================

pub struct TranscriptionAdapter {
    inner: Arc<dyn SpeechToText>,
}

impl TranscriptionAdapter {
    pub fn new(inner: Arc<dyn SpeechToText>) -> Self {
        Self { inner }
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    /// Transcribe the audio held in a scratch file
    pub async fn transcribe(&self, scratch: &ScratchAudio) -> Result<String> {
        self.transcribe_path(scratch.path()).await
    }

    async fn transcribe_path(&self, path: &Path) -> Result<String> {
        self.inner
            .transcribe_file(path)
            .await
            .map_err(|e| match e {
                Error::Transcription(_) => e,
                other => Error::Transcription(other.reason().to_string()),
            })
    }
}

// =============================================================================
// Synthesis
// =============================================================================

pub struct SpeechSynthesisAdapter {
    inner: Arc<dyn TextToSpeech>,
}

impl SpeechSynthesisAdapter {
    pub fn new(inner: Arc<dyn TextToSpeech>) -> Self {
        Self { inner }
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let audio = self.inner.synthesize(text).await.map_err(|e| match e {
            Error::Synthesis(_) => e,
            other => Error::Synthesis(other.reason().to_string()),
        })?;

        if audio.is_empty() {
            return Err(Error::Synthesis(format!(
                "{} produced no audio",
                self.inner.model_name()
            )));
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoStt;

    #[async_trait]
    impl SpeechToText for EchoStt {
        async fn transcribe(&self, audio: &[u8]) -> Result<String> {
            Ok(String::from_utf8_lossy(audio).into_owned())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct BrokenStt;

    #[async_trait]
    impl SpeechToText for BrokenStt {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
            Err(Error::StoreUnavailable("wrong kind on purpose".to_string()))
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    struct FixedTts(Vec<u8>);

    #[async_trait]
    impl TextToSpeech for FixedTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_transcribes_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchAudio::write("bàn phím".as_bytes(), Some(dir.path())).unwrap();
        let adapter = TranscriptionAdapter::new(Arc::new(EchoStt));
        assert_eq!(adapter.transcribe(&scratch).await.unwrap(), "bàn phím");
    }

    #[tokio::test]
    async fn test_any_stt_fault_is_transcription_error() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchAudio::write(b"x", Some(dir.path())).unwrap();
        let adapter = TranscriptionAdapter::new(Arc::new(BrokenStt));
        assert!(matches!(
            adapter.transcribe(&scratch).await,
            Err(Error::Transcription(msg)) if msg == "wrong kind on purpose"
        ));
    }

    #[tokio::test]
    async fn test_missing_scratch_file_is_transcription_error() {
        let adapter = TranscriptionAdapter::new(Arc::new(EchoStt));
        let err = adapter.transcribe_path(Path::new("/nonexistent/input.wav")).await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }

    #[tokio::test]
    async fn test_empty_synthesis_is_error() {
        let adapter = SpeechSynthesisAdapter::new(Arc::new(FixedTts(Vec::new())));
        assert!(matches!(adapter.synthesize("hi").await, Err(Error::Synthesis(_))));

        let adapter = SpeechSynthesisAdapter::new(Arc::new(FixedTts(vec![1, 2])));
        assert_eq!(adapter.synthesize("hi").await.unwrap(), vec![1, 2]);
    }
}
