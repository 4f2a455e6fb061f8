//! Comparison-key policy shared by both sides of a reconciliation.

use routerecon_engine::ExtractedRecord;
use serde::Deserialize;

/// Which extracted value feeds the comparison key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum KeySource {
    #[default]
    Primary,
    /// Named additional or constructed field.
    Field(String),
}

impl From<String> for KeySource {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("primary") {
            Self::Primary
        } else {
            Self::Field(trimmed.to_string())
        }
    }
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Field(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    pub source: KeySource,
    pub case_insensitive: bool,
    /// Remove every whitespace character (NBSP included), not only the ends.
    pub strip_whitespace: bool,
}

impl Default for MatchKey {
    fn default() -> Self {
        Self { source: KeySource::Primary, case_insensitive: true, strip_whitespace: true }
    }
}

impl MatchKey {
    /// Normalise a raw key. Applied identically to extracted and reference keys.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let stripped: String = if self.strip_whitespace {
            trimmed.chars().filter(|c| !c.is_whitespace()).collect()
        } else {
            trimmed.to_string()
        };
        if self.case_insensitive {
            stripped.to_lowercase()
        } else {
            stripped
        }
    }

    /// Un-normalised key text of a record. A missing field reads as `""`.
    pub fn raw_value<'a>(&self, record: &'a ExtractedRecord) -> &'a str {
        match &self.source {
            KeySource::Primary => &record.primary_value,
            KeySource::Field(name) => record.field(name).unwrap_or(""),
        }
    }

    pub fn project(&self, record: &ExtractedRecord) -> String {
        self.normalize(self.raw_value(record))
    }
}
