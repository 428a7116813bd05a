//! Configuration management for the store assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files under `config/`
//! - Environment variables (`STORE_ASSISTANT__` prefix, `__` separator)
//!
//! Every field has a default, so an empty environment yields a runnable
//! development setup.

pub mod constants;
pub mod pipeline;
pub mod settings;

pub use pipeline::{LlmProvider, LlmSettings, PipelineConfig, SttSettings, TtsSettings};
pub use settings::{
    load_settings, load_settings_from, ArtifactConfig, AuthConfig, CatalogConfig,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
