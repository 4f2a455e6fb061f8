use std::fmt;

use serde::Serialize;

/// One illegal placeholder found while loading a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderIssue {
    /// JSON path of the string leaf, e.g. `$.items[2].name`.
    pub path: String,
    pub placeholder: String,
    pub message: String,
}

impl fmt::Display for PlaceholderIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}' {}", self.path, self.placeholder, self.message)
    }
}

/// Fatal template load failure.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template is not valid JSON: {0}")]
    Json(String),

    #[error("{} invalid placeholder(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<PlaceholderIssue>),
}

impl TemplateError {
    pub fn issues(&self) -> &[PlaceholderIssue] {
        match self {
            Self::Invalid(issues) => issues,
            Self::Json(_) => &[],
        }
    }
}

fn join_issues(issues: &[PlaceholderIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionErrorKind {
    /// `{row.X}` named a column the row does not have.
    MissingColumn,
    /// `{func.next_id}` with no entity class to pick a partition from.
    NoPartition,
}

/// Per-field resolution failure. The payload is still produced, with `""`
/// in place of the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateResolutionError {
    pub kind: ResolutionErrorKind,
    /// Position of the row in the batch.
    pub row: usize,
    /// Identifier of the row, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_identifier: Option<String>,
    /// JSON path of the string leaf.
    pub path: String,
    pub message: String,
}

impl fmt::Display for TemplateResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.row_identifier {
            Some(id) => write!(f, "row {} ('{}') at {}: {}", self.row, id, self.path, self.message),
            None => write!(f, "row {} at {}: {}", self.row, self.path, self.message),
        }
    }
}
