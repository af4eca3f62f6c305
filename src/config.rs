//! Configuration loading and management for summa-pdf.
//!
//! Loads settings from `summa.toml` with environment variable overrides for
//! provider endpoints and sensitive data. Every setting has a default, so a
//! missing config file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::extractor::PageRange;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
    #[error("invalid config value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Local model server (Ollama) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the server, without the `/api/generate` suffix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Cloud completion API (OpenAI) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL of the API, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Optional organization id sent with every request
    pub organization: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Loaded from `OPENAI_API_KEY` only, never from the config file
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// PDF extraction settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Only pages in `[start, end)` are extracted when set
    pub page_range: Option<PageRange>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on the size of a multipart upload
    pub max_upload_bytes: usize,
    /// Directory for upload temp files, the system temp dir when unset
    pub upload_dir: Option<PathBuf>,
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file, stderr only when unset
    pub dir: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
    pub extractor: ExtractorConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location (summa.toml in cwd or home),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from(&path)?,
            None => Config::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific path without environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Timeouts must be non-zero.
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, secs) in [
            ("ollama.timeout_secs", self.ollama.timeout_secs),
            ("openai.timeout_secs", self.openai.timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Override settings from environment variables.
    ///
    /// `lookup` resolves a variable name to its value; blank values count as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("OLLAMA_API_URL") {
            self.ollama.base_url = url;
        }
        if let Some(timeout) = var("OLLAMA_TIMEOUT") {
            self.ollama.timeout_secs = parse_timeout("OLLAMA_TIMEOUT", &timeout)?;
        }
        if let Some(url) = var("OPENAI_API_URL") {
            self.openai.base_url = url;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(org) = var("OPENAI_ORGANIZATION") {
            self.openai.organization = Some(org);
        }
        if let Some(timeout) = var("OPENAI_TIMEOUT") {
            self.openai.timeout_secs = parse_timeout("OPENAI_TIMEOUT", &timeout)?;
        }

        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("summa.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("summa")
            .join("summa.toml");
        home_config.exists().then_some(home_config)
    }
}

/// Timeouts may be given as whole or fractional seconds ("60", "60.0").
fn parse_timeout(name: &str, value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    };
    let secs: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid());
    }
    Ok(secs.ceil() as u64)
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            organization: None,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
            upload_dir: None,
        }
    }
}
