//! HTTP TTS Backend - OpenAI-compatible speech endpoint
//!
//! Posts `{model, input, voice, response_format: "wav"}` to
//! `{url}/v1/audio/speech` and returns the response body as WAV bytes.

use async_trait::async_trait;
use serde::Serialize;
use std::time::{Duration, Instant};

use store_assistant_config::TtsSettings;
use store_assistant_core::{Error, Result, TextToSpeech};

use crate::PipelineError;

/// HTTP TTS Backend configuration
#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    pub url: String,
    pub model: String,
    pub voice: String,
    pub timeout_ms: u64,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self::from(&TtsSettings::default())
    }
}

impl From<&TtsSettings> for HttpTtsConfig {
    fn from(settings: &TtsSettings) -> Self {
        Self {
            url: settings.url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            voice: settings.voice.clone(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

/// HTTP TTS Backend
pub struct HttpTtsBackend {
    config: HttpTtsConfig,
    client: reqwest::Client,
}

impl HttpTtsBackend {
    pub fn new(config: HttpTtsConfig) -> std::result::Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(url = %config.url, model = %config.model, voice = %config.voice, "HTTP TTS backend configured");
        Ok(Self { config, client })
    }

    fn speech_url(&self) -> String {
        format!("{}/v1/audio/speech", self.config.url)
    }

    async fn request(&self, text: &str) -> std::result::Result<Vec<u8>, PipelineError> {
        let start = Instant::now();
        let body = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            response_format: "wav",
        };

        let response = self
            .client
            .post(self.speech_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Network(format!("HTTP TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Tts(format!(
                "HTTP TTS service returned error: {}",
                response.status()
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Tts(format!("Failed to read TTS response: {}", e)))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = audio.len(),
            "Synthesis finished"
        );
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl TextToSpeech for HttpTtsBackend {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.request(text)
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = SpeechRequest {
            model: "tts-1",
            input: "Bàn phím ở Zone 2.",
            voice: "default",
            response_format: "wav",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"], "wav");
        assert_eq!(json["input"], "Bàn phím ở Zone 2.");
    }

    #[test]
    fn test_speech_url() {
        let backend = HttpTtsBackend::new(HttpTtsConfig {
            url: "http://tts.local:8091".to_string(),
            ..HttpTtsConfig::default()
        })
        .unwrap();
        assert_eq!(backend.speech_url(), "http://tts.local:8091/v1/audio/speech");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_synthesis_error() {
        let backend = HttpTtsBackend::new(HttpTtsConfig {
            url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
            ..HttpTtsConfig::default()
        })
        .unwrap();
        assert!(matches!(backend.synthesize("xin chào").await, Err(Error::Synthesis(_))));
    }
}
