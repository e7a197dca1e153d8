//! Application configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables. Command-line flags are applied last by the CLI.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 3001
//! llm:
//!   api_base: https://api.openai.com/v1
//! generation:
//!   model: gpt-3.5-turbo
//!   temperature: 0.7
//!   id_strategy: per-kind
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, LlmError};
use crate::generator::GenerationSettings;
use crate::llm::{OpenAiClient, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Default JSON body limit for the HTTP API (50 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Model endpoint settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    /// Usually supplied through `OPENAI_API_KEY` rather than the file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_base", &self.api_base)
            .field("has_api_key", &self.api_key.is_some())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Builds the chat completion client.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` when talking to the default hosted
    /// endpoint without a key. Self-hosted endpoints may omit it.
    pub fn build_client(&self, default_model: &str) -> Result<OpenAiClient, LlmError> {
        if self.api_key.is_none() && self.api_base.trim_end_matches('/') == DEFAULT_API_BASE {
            return Err(LlmError::MissingApiKey);
        }
        OpenAiClient::new(
            self.api_base.clone(),
            self.api_key.clone(),
            default_model,
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub generation: GenerationSettings,
}

impl AppConfig {
    /// Loads configuration from an optional YAML file, then applies
    /// environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML file. Missing sections and fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Applies overrides from a variable lookup.
    ///
    /// # Environment Variables
    ///
    /// - `OPENAI_API_KEY`: API key for the model endpoint
    /// - `OPENAI_API_BASE`: Base URL of the model endpoint
    /// - `EXAM_FORGE_MODEL`: Model used for generation
    /// - `EXAM_FORGE_HOST`: Listen address
    /// - `PORT`: Listen port
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            self.llm.api_base = base;
        }
        if let Some(model) = lookup("EXAM_FORGE_MODEL") {
            self.generation.model = model;
        }
        if let Some(host) = lookup("EXAM_FORGE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value(&port, "PORT")?;
        }
        Ok(())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        if generation.model.trim().is_empty() {
            return Err(invalid("generation.model", "cannot be empty"));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(invalid("generation.temperature", "must be between 0.0 and 2.0"));
        }
        if generation.max_source_chars == 0 {
            return Err(invalid("generation.max_source_chars", "must be greater than 0"));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(invalid("llm.request_timeout_secs", "must be greater than 0"));
        }
        if generation.run_timeout_secs < self.llm.request_timeout_secs {
            return Err(invalid(
                "generation.run_timeout_secs",
                "cannot be shorter than llm.request_timeout_secs",
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(invalid("server.body_limit_bytes", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("could not parse '{}'", value),
    })
}
