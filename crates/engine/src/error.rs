use std::fmt;

use serde::Serialize;

/// One problem found while loading a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleIssue {
    /// Position of the rule in `Entities`.
    pub index: usize,
    /// Rule name, when it could be read.
    pub rule: Option<String>,
    pub message: String,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(name) => write!(f, "rule #{} '{}': {}", self.index, name, self.message),
            None => write!(f, "rule #{}: {}", self.index, self.message),
        }
    }
}

/// Fatal rule-set load failure. Never partially applied.
#[derive(Debug, thiserror::Error)]
pub enum RuleDefinitionError {
    /// The document is not JSON or has the wrong top-level shape.
    #[error("rule set is not valid JSON: {0}")]
    Json(String),

    /// Every invalid rule, in document order.
    #[error("{} invalid rule(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<RuleIssue>),
}

impl RuleDefinitionError {
    pub fn issues(&self) -> &[RuleIssue] {
        match self {
            Self::Invalid(issues) => issues,
            Self::Json(_) => &[],
        }
    }
}

fn join_issues(issues: &[RuleIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

/// What went wrong with a single cell or column during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No `searchIn` candidate carried the wanted header.
    HeaderNotFound,
    /// `valueFromRowOffset` pointed above the first row or past the last.
    OffsetOutOfRange,
    /// A `constructFields` placeholder had no value to draw from.
    ConstructFieldMissingSource,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound => write!(f, "header_not_found"),
            Self::OffsetOutOfRange => write!(f, "offset_out_of_range"),
            Self::ConstructFieldMissingSource => write!(f, "construct_field_missing_source"),
        }
    }
}

/// Recorded anomaly; extraction continues for every other cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionWarning {
    pub kind: WarningKind,
    pub rule: String,
    pub sheet: String,
    /// A1 address of the matched cell.
    pub cell: String,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{} [{}]: {}", self.sheet, self.cell, self.rule, self.message)
    }
}
