//! HTTP STT Backend - Calls an external transcription sidecar
//!
//! The sidecar owns the speech model. This client posts the complete WAV
//! upload to `{url}/transcribe` with the language hint in `X-Language` and
//! reads back `{text}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use store_assistant_config::SttSettings;
use store_assistant_core::{Error, Result, SpeechToText};

use crate::PipelineError;

/// HTTP STT Backend configuration
#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    /// Base URL of the STT service
    pub url: String,
    /// Language code (e.g., "vi")
    pub language: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpSttConfig {
    fn default() -> Self {
        Self::from(&SttSettings::default())
    }
}

impl From<&SttSettings> for HttpSttConfig {
    fn from(settings: &SttSettings) -> Self {
        Self {
            url: settings.url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// Response from the STT service
#[derive(Debug, Deserialize)]
struct SttResponse {
    text: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP STT Backend
pub struct HttpSttBackend {
    config: HttpSttConfig,
    client: reqwest::Client,
    name: String,
}

impl HttpSttBackend {
    /// Create a new HTTP STT backend
    pub fn new(config: HttpSttConfig) -> std::result::Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(url = %config.url, language = %config.language, "HTTP STT backend configured");

        let name = format!("http-stt({})", config.language);
        Ok(Self { config, client, name })
    }

    fn transcribe_url(&self) -> String {
        format!("{}/transcribe", self.config.url)
    }

    async fn request(&self, audio: &[u8]) -> std::result::Result<String, PipelineError> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.transcribe_url())
            .header("Content-Type", "audio/wav")
            .header("X-Language", &self.config.language)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| PipelineError::Network(format!("HTTP STT request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Stt(format!(
                "HTTP STT service returned error: {}",
                response.status()
            )));
        }

        let result: SttResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Stt(format!("Failed to parse STT response: {}", e)))?;

        if let Some(error) = result.error.filter(|e| !e.is_empty()) {
            return Err(PipelineError::Stt(error));
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = result.text.chars().count(),
            "Transcription finished"
        );
        Ok(result.text)
    }
}

#[async_trait]
impl SpeechToText for HttpSttBackend {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        self.request(audio)
            .await
            .map_err(|e| Error::Transcription(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
