use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::key::{KeySource, MatchKey};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Entity class → how to reconcile it.
    pub entities: BTreeMap<String, EntityConfig>,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Reference data file, relative to the config file.
    pub reference: String,
    #[serde(default)]
    pub key: KeySource,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    #[serde(default = "default_true")]
    pub strip_whitespace: bool,
    /// Leave struck-through workbook records out of the comparison.
    #[serde(default)]
    pub skip_struck: bool,
    /// Present when `reference` is a raw API response rather than a
    /// key → attributes object.
    #[serde(default)]
    pub layout: Option<ReferenceLayout>,
}

impl EntityConfig {
    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            source: self.key.clone(),
            case_insensitive: self.case_insensitive,
            strip_whitespace: self.strip_whitespace,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Reference layout
// ---------------------------------------------------------------------------

/// Shape of an API response: an array of items, each optionally wrapping
/// its fields in a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceLayout {
    /// Field holding the per-item object, e.g. `"data"`.
    #[serde(default)]
    pub nested: Option<String>,
    #[serde(default = "default_key_field")]
    pub key_field: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Extra item fields copied into the attributes. Empty copies none.
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl Default for ReferenceLayout {
    fn default() -> Self {
        Self {
            nested: Some("data".into()),
            key_field: default_key_field(),
            id_field: default_id_field(),
            attributes: Vec::new(),
        }
    }
}

fn default_key_field() -> String {
    "name".into()
}

fn default_id_field() -> String {
    "id".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig = toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.entities.is_empty() {
            return Err(ReconError::ConfigValidation("at least one [entities.<class>] table is required".into()));
        }

        for (class, entity) in &self.entities {
            if class.trim().is_empty() {
                return Err(ReconError::ConfigValidation("entity class names must not be empty".into()));
            }
            if entity.reference.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("entity '{class}': reference path is empty")));
            }
            if let Some(layout) = &entity.layout {
                if layout.key_field.trim().is_empty() || layout.id_field.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "entity '{class}': layout key_field and id_field must not be empty"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn entity(&self, class: &str) -> Option<&EntityConfig> {
        self.entities.get(class)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
