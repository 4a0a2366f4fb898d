use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::AppConfig;
use crate::store::DurableStore;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl AppConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/ptydeck/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("ptydeck").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `AppConfig::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parses and validates configuration text that did not come from a file.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The shell is set
    /// - The initial terminal size is non-zero
    /// - The agent command is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal.shell.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "terminal.shell must not be empty".to_string(),
            });
        }

        if self.terminal.cols == 0 || self.terminal.rows == 0 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "terminal size must be non-zero (got {}x{})",
                    self.terminal.cols, self.terminal.rows
                ),
            });
        }

        if self.agent.command.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "agent.command must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Where the project/session document lives.
    pub fn document_path(&self) -> PathBuf {
        self.storage
            .document_path
            .clone()
            .unwrap_or_else(DurableStore::default_path)
    }

    /// Where attached sessions write their log.
    pub fn log_file_path(&self) -> PathBuf {
        self.logging.file.clone().unwrap_or_else(|| {
            let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            data_dir.join("ptydeck").join("ptydeck.log")
        })
    }
}
