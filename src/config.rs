//! Configuration management for kag-translate.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::script::ScriptCodec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "KagTranslate";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion API configuration.
    pub api: ApiConfig,

    /// Generation parameters shared by both pipeline stages.
    pub generation: GenerationConfig,

    /// Scene context settings.
    pub context: ContextConfig,

    /// Lookup table locations.
    pub paths: PathsConfig,

    /// Script file I/O settings.
    pub io: IoConfig,

    /// Debug output settings.
    pub debug: DebugConfig,
}

/// API configuration for an OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key. Left empty for local servers that don't check it.
    pub key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: "http://localhost:8000/v1".to_string(),
            model: "IlyaGusev/saiga_gemma3_12b".to_string(),
        }
    }
}

impl ApiConfig {
    /// Checks if an API key is set.
    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum number of new tokens per request.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Number of attempts before falling back to the sentinel.
    pub retry_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.3,
            retry_count: 10,
        }
    }
}

/// Scene context configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Whether to build scene context for each line.
    pub enabled: bool,

    /// Number of lines before and after the target line.
    pub window_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 4,
        }
    }
}

/// Lookup table locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the lookup tables.
    /// Defaults to `kag_data` inside the config directory.
    pub data_directory: Option<PathBuf>,

    /// Name dictionary filename, relative to the data directory.
    pub names_file: PathBuf,

    /// Speaker database filename, relative to the data directory.
    pub speakers_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            names_file: PathBuf::from("names.json"),
            speakers_file: PathBuf::from("kag_db.json"),
        }
    }
}

/// Script file I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Encoding label for input and output scripts (e.g. "UTF-8", "Shift_JIS").
    pub encoding: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
        }
    }
}

/// Debug output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Print every prompt before it is sent.
    pub show_prompts: bool,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(invalid("api.base_url", &e.to_string()));
        }

        if self.api.model.trim().is_empty() {
            return Err(invalid("api.model", "must not be empty"));
        }

        if self.generation.max_tokens == 0 {
            return Err(invalid("generation.max_tokens", "must be greater than 0"));
        }

        if self.generation.retry_count == 0 {
            return Err(invalid("generation.retry_count", "must be greater than 0"));
        }

        let temperature = self.generation.temperature;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(invalid(
                "generation.temperature",
                "must be a non-negative number",
            ));
        }

        if ScriptCodec::for_label(&self.io.encoding).is_err() {
            return Err(invalid("io.encoding", "unknown encoding label"));
        }

        Ok(())
    }

    /// Returns the effective data directory, using config or default.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.paths.data_directory {
            Ok(dir.clone())
        } else {
            Ok(Self::config_dir()?.join("kag_data"))
        }
    }

    /// Full path of the name dictionary file.
    pub fn names_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(&self.paths.names_file))
    }

    /// Full path of the speaker database file.
    pub fn speakers_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(&self.paths.speakers_file))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
