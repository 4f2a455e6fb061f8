// User settings
// Loaded from <config_dir>/routerecon/settings.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "routerecon";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{0}")]
    Invalid(String),
}

/// Where named documents live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathSettings {
    /// JSON payload templates (`templates list|show|save|delete`)
    pub template_dir: PathBuf,
    /// Rule sets referenced by bare name
    pub rules_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        let base = Settings::config_dir();
        Self { template_dir: base.join("templates"), rules_dir: base.join("rules") }
    }
}

/// Where the previous session's highest IDs are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataSettings {
    pub sheet: String,
    pub vq_cell: String,
    pub other_cell: String,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self { sheet: "Metadata".into(), vq_cell: "B1".into(), other_cell: "B2".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `error`, `warn`, `info`, `debug` or `trace`; `-v` and `RUST_LOG` win
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "warn".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub metadata: MetadataSettings,
    pub log: LogSettings,
}

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl Settings {
    /// `<config_dir>/routerecon`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.toml")
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is
    /// an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read { path: path.to_path_buf(), source: e }),
        };

        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        settings.validate()?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log.level '{}' is not one of {}",
                self.log.level,
                LEVELS.join(", ")
            )));
        }
        if self.metadata.sheet.trim().is_empty() {
            return Err(ConfigError::Invalid("metadata.sheet must not be empty".into()));
        }
        for (field, cell) in [("vqCell", &self.metadata.vq_cell), ("otherCell", &self.metadata.other_cell)] {
            if !is_a1(cell) {
                return Err(ConfigError::Invalid(format!("metadata.{field} '{cell}' is not a cell address")));
            }
        }
        Ok(())
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write { path: parent.to_path_buf(), source: e })?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, text).map_err(|e| ConfigError::Write { path: path.to_path_buf(), source: e })
    }
}

/// Letters then a 1-based row number, e.g. `B1`.
fn is_a1(cell: &str) -> bool {
    let cell = cell.trim();
    let letters = cell.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = &cell[letters..];
    letters > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && !digits.trim_start_matches('0').is_empty()
}
