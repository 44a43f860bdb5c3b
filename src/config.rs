use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

/// Settings for the generative-AI chat assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Replaces the built-in companion persona when set
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            assistant: AssistantConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            system_instruction: None,
        }
    }
}

impl AssistantConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// Default value functions
fn default_database_path() -> String {
    // This is a fallback - actual profile will be determined at load time
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let mut config = Self::load_from_path(&config_path, profile)?;

        // Dev profile always gets its own database, whatever the file says
        if profile == utils::Profile::Dev {
            config.database_path = Self::default_database_path_for_profile(profile);
        }
        Ok(config)
    }

    /// Load configuration from an explicit file path, creating it with defaults if missing
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            if let Err(e) = config.save_to_path(config_path) {
                tracing::error!(path = %config_path.display(), error = %e, "failed to save config file");
                return Err(e);
            }
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("aurora.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/aurora-dev/aurora.db".to_string(),
                utils::Profile::Prod => "~/.local/share/aurora/aurora.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }
}
