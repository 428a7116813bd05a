//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, LlmSettings, PipelineConfig, SttSettings, TtsSettings};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Product and voucher catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Generated audio storage
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Speech-to-text backend
    #[serde(default)]
    pub stt: SttSettings,

    /// Text-to-speech backend
    #[serde(default)]
    pub tts: TtsSettings,

    /// Generative model backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_catalog()?;
        self.validate_artifacts()?;
        self.validate_pipeline()?;
        self.validate_llm()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.auth.enabled && server.auth.api_key.as_deref().map_or(true, str::is_empty) {
            if self.environment.is_strict() {
                return Err(ConfigError::InvalidValue {
                    field: "server.auth.api_key".to_string(),
                    message: "API key required when auth is enabled".to_string(),
                });
            }
            tracing::warn!("Auth enabled without an API key; all protected requests will be rejected");
        }

        if self.environment.is_production()
            && server.cors_enabled
            && server.cors_origins.iter().any(|o| o == "*")
        {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_origins".to_string(),
                message: "Wildcard origin not allowed in production".to_string(),
            });
        }

        Ok(())
    }

    fn validate_catalog(&self) -> Result<(), ConfigError> {
        if self.catalog.database_path.trim().is_empty() {
            return Err(ConfigError::MissingField("catalog.database_path".to_string()));
        }

        if let Some(seed) = &self.catalog.seed_path {
            if !Path::new(seed).exists() {
                if self.environment.is_strict() {
                    return Err(ConfigError::FileNotFound(seed.clone()));
                }
                tracing::warn!(path = %seed, "Catalog seed file not found");
            }
        }

        Ok(())
    }

    fn validate_artifacts(&self) -> Result<(), ConfigError> {
        if self.artifacts.directory.trim().is_empty() {
            return Err(ConfigError::MissingField("artifacts.directory".to_string()));
        }

        if self.artifacts.retention_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "artifacts.retention_secs".to_string(),
                message: "Retention must be at least 1 second when set".to_string(),
            });
        }

        if self.artifacts.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "artifacts.sweep_interval_secs".to_string(),
                message: "Sweep interval must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;

        let timeouts = [
            ("pipeline.transcription_timeout_ms", pipeline.transcription_timeout_ms),
            ("pipeline.store_timeout_ms", pipeline.store_timeout_ms),
            ("pipeline.generation_timeout_ms", pipeline.generation_timeout_ms),
            ("pipeline.synthesis_timeout_ms", pipeline.synthesis_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }
        }

        if pipeline.max_audio_bytes < 44 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.max_audio_bytes".to_string(),
                message: "Must fit at least a WAV header (44 bytes)".to_string(),
            });
        }

        if pipeline.no_match_message.trim().is_empty() {
            return Err(ConfigError::MissingField("pipeline.no_match_message".to_string()));
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable authentication (set to false for development)
    #[serde(default)]
    pub enabled: bool,

    /// API key (set via STORE_ASSISTANT__SERVER__AUTH__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication (e.g., health checks)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

/// Product and voucher catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// JSON/YAML seed loaded at startup and on admin reload
    #[serde(default)]
    pub seed_path: Option<String>,
}

fn default_database_path() -> String {
    "data/catalog.db".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            seed_path: None,
        }
    }
}

/// Generated audio storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Flat directory holding `output_<id>.wav` files
    #[serde(default = "default_artifact_dir")]
    pub directory: String,

    /// Delete artifacts older than this. Unset keeps them until deleted.
    #[serde(default)]
    pub retention_secs: Option<u64>,

    /// How often the retention sweeper runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_artifact_dir() -> String {
    "data/audio".to_string()
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: default_artifact_dir(),
            retention_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable the Prometheus recorder and `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/default`, `config/{env}` and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from files under `dir`
pub fn load_settings_from(dir: impl AsRef<Path>, env: Option<&str>) -> Result<Settings, ConfigError> {
    let dir = dir.as_ref();
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("STORE_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}
