//! Configuration loading from toolrelay.toml.

use runtime::model::backend::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use runtime::tools::country::DEFAULT_COUNTRY_API;
use runtime::{ExecutionMode, ExecutorConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub country: CountryConfig,
}

/// Model backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Chat endpoint of the Ollama server.
    pub endpoint: String,

    /// Model to use.
    pub model: String,

    /// Ignore http_proxy/https_proxy for backend requests.
    pub bypass_proxy: bool,

    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            bypass_proxy: true,
            request_timeout_secs: 120,
        }
    }
}

/// Tool execution configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Per-call timeout.
    pub timeout_secs: u64,

    /// Run the calls of one decision concurrently.
    pub concurrent: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            concurrent: false,
        }
    }
}

impl ToolsConfig {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            mode: if self.concurrent {
                ExecutionMode::Concurrent
            } else {
                ExecutionMode::Sequential
            },
        }
    }
}

/// Settings for the bundled get_country_info tool.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CountryConfig {
    pub base_url: String,
    pub bypass_proxy: bool,
}

impl Default for CountryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COUNTRY_API.to_string(),
            bypass_proxy: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model must not be empty".into()));
        }
        if self.backend.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend.endpoint must not be empty".into(),
            ));
        }
        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tools.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
