//! Query pipeline and model backend configuration

use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, generation, limits, timeouts};

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Timeout for the transcription call
    #[serde(default = "default_transcription_timeout")]
    pub transcription_timeout_ms: u64,

    /// Timeout for the store lookup
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    /// Timeout for the generation call
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_ms: u64,

    /// Timeout for the synthesis call
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_ms: u64,

    /// Return the text answer without audio when synthesis or the artifact
    /// write fails, instead of failing the voice request
    #[serde(default)]
    pub degrade_on_synthesis_failure: bool,

    /// Largest accepted voice upload in bytes
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,

    /// Directory for scratch input audio (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<String>,

    /// Reply when no product matches
    #[serde(default = "default_no_match_message")]
    pub no_match_message: String,
}

fn default_transcription_timeout() -> u64 {
    timeouts::STT_TIMEOUT_MS
}
fn default_store_timeout() -> u64 {
    timeouts::STORE_LOOKUP_MS
}
fn default_generation_timeout() -> u64 {
    timeouts::LLM_REQUEST_MS
}
fn default_synthesis_timeout() -> u64 {
    timeouts::TTS_TIMEOUT_MS
}
fn default_max_audio_bytes() -> usize {
    limits::MAX_AUDIO_BYTES
}
fn default_no_match_message() -> String {
    generation::NO_MATCH_MESSAGE.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transcription_timeout_ms: default_transcription_timeout(),
            store_timeout_ms: default_store_timeout(),
            generation_timeout_ms: default_generation_timeout(),
            synthesis_timeout_ms: default_synthesis_timeout(),
            degrade_on_synthesis_failure: false,
            max_audio_bytes: default_max_audio_bytes(),
            scratch_dir: None,
            no_match_message: default_no_match_message(),
        }
    }
}

/// Speech-to-text sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    #[serde(default = "default_stt_url")]
    pub url: String,

    /// Language hint sent with each request
    #[serde(default = "default_language")]
    pub language: String,

    /// HTTP client timeout
    #[serde(default = "default_transcription_timeout")]
    pub timeout_ms: u64,
}

fn default_stt_url() -> String {
    endpoints::STT_DEFAULT.to_string()
}
fn default_language() -> String {
    "vi".to_string()
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            url: default_stt_url(),
            language: default_language(),
            timeout_ms: default_transcription_timeout(),
        }
    }
}

/// Text-to-speech sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_url")]
    pub url: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_synthesis_timeout")]
    pub timeout_ms: u64,
}

fn default_tts_url() -> String {
    endpoints::TTS_DEFAULT.to_string()
}
fn default_tts_model() -> String {
    "tts-1".to_string()
}
fn default_voice() -> String {
    "default".to_string()
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            model: default_tts_model(),
            voice: default_voice(),
            timeout_ms: default_synthesis_timeout(),
        }
    }
}

/// Which completion API the LLM endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    /// OpenAI-compatible `/completions` (llama.cpp server, vLLM)
    OpenAi,
}

/// Generative model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key (OpenAI-compatible providers only)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP client timeout
    #[serde(default = "default_generation_timeout")]
    pub timeout_ms: u64,

    /// Retries on transient network failures. The pipeline itself never retries.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}
fn default_llm_model() -> String {
    "phi".to_string()
}
fn default_max_tokens() -> usize {
    generation::MAX_TOKENS
}
fn default_temperature() -> f32 {
    0.2
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_generation_timeout(),
            max_retries: 0,
        }
    }
}
