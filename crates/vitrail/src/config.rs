//! Configuration file loading for vitrail.
//!
//! Reads `vitrail.config.json` from a directory (the current working directory
//! by default). A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitrail_maestro::{AppOptions, DispatcherOptions};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "vitrail.config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid log level \"{0}\" (expected trace, debug, info, warn or error)")]
    InvalidLevel(String),
}

/// Top-level vitrail configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VitrailConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dispatcher: DispatcherOptions,
}

/// Configuration for [`crate::init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Colored output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            ansi: false,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidLevel(self.level.clone()))
    }
}

impl VitrailConfig {
    /// Options for apps created under this configuration.
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// Load `vitrail.config.json` from the given directory (or CWD if None).
pub fn load_config(dir: Option<&Path>) -> Result<VitrailConfig, ConfigError> {
    let base = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?,
    };
    let config_path = base.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(VitrailConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let config: VitrailConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })?;
    config.logging.max_level()?;
    Ok(config)
}
