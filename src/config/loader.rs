use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::Settings;
use super::{validate_addr, AddrError};

/// Errors that can occur when loading settings.
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

    #[error("invalid address {addr:?}: {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: AddrError,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Settings {
    /// Default settings file location.
    ///
    /// `~/.config/droopy/config.toml` on Linux, the platform equivalent
    /// elsewhere via `dirs::config_dir()`, or the current directory.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("droopy").join("config.toml")
    }

    /// Load settings from `explicit` if given, else from the default
    /// location if that file exists, else use built-in defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Ok(Settings::default());
                }
                Self::load_from(&path)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Checks:
    /// - the listener address is well formed
    /// - tick and broadcast timings are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulator;
        validate_addr(&sim.addr).map_err(|source| ConfigError::InvalidAddr {
            addr: sim.addr.clone(),
            source,
        })?;

        if sim.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "tick_interval_ms must be greater than zero".to_string(),
            });
        }
        if sim.broadcast_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "broadcast_timeout_ms must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
