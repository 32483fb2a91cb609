//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::FetcherConfig;
use crate::models::Region;
use crate::pipeline::{PipelineConfig, MAX_MATCH_COUNT};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL with a `{host}` placeholder
    #[serde(default = "default_base_url_template")]
    pub base_url_template: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// In-flight match detail requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Match ids listed per wanted match
    #[serde(default = "default_over_fetch_factor")]
    pub over_fetch_factor: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url_template() -> String {
    "https://{host}.api.riotgames.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_concurrent_requests() -> usize {
    1
}

fn default_over_fetch_factor() -> u32 {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url_template: default_base_url_template(),
            timeout_seconds: default_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
            over_fetch_factor: default_over_fetch_factor(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            base_url_template: self.base_url_template.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            over_fetch_factor: self.over_fetch_factor,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

/// Defaults applied when the command line leaves a value out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_region")]
    pub region: Region,

    #[serde(default = "default_match_count")]
    pub match_count: u32,
}

fn default_region() -> Region {
    Region::Euw
}

fn default_match_count() -> u32 {
    10
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            match_count: default_match_count(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.api.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationError(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        if self.api.over_fetch_factor == 0 {
            return Err(ConfigError::ValidationError(
                "over_fetch_factor must be at least 1".to_string(),
            ));
        }

        if !self.api.base_url_template.contains("{host}") {
            return Err(ConfigError::ValidationError(
                "base_url_template must contain {host}".to_string(),
            ));
        }

        if self.defaults.match_count == 0 || self.defaults.match_count > MAX_MATCH_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "Default match count must be between 1 and {}",
                MAX_MATCH_COUNT
            )));
        }

        Ok(())
    }
}
