//! TOML-based configuration.
//!
//! Supports a config file (soarbase.toml):
//! ```toml
//! [project]
//! database_path = "./project.soar"
//! auto_apply_corrections = false
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Project configuration.
    #[serde(default)]
    pub project: ProjectSettings,
}

/// Project configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Path to the project database.
    pub database_path: String,

    /// Apply proposed datamap corrections without asking.
    pub auto_apply_corrections: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            database_path: "project.soar".to_string(),
            auto_apply_corrections: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SOARBASE_CONFIG`
    /// 2. `./soarbase.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SOARBASE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("soarbase.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}
