use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{PlaceholderIssue, TemplateError};

/// `{kind.name}`; `kind` is matched case-insensitively.
pub(crate) static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\.([^}]+)\}").unwrap());

pub(crate) const NEXT_ID: &str = "next_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `{row.<Column>}`
    Row(String),
    /// `{func.next_id}`
    NextId,
}

impl Placeholder {
    pub fn parse(kind: &str, name: &str) -> Result<Self, String> {
        let name = name.trim();
        match kind.to_ascii_lowercase().as_str() {
            "row" if name.is_empty() => Err("names no column".into()),
            "row" => Ok(Self::Row(name.to_string())),
            "func" if name == NEXT_ID => Ok(Self::NextId),
            "func" => Err(format!("unknown function '{name}'")),
            other => Err(format!("unknown placeholder kind '{other}'")),
        }
    }
}

/// A validated JSON template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    body: Value,
    entity_class: Option<String>,
    uses_next_id: bool,
}

impl Template {
    pub fn from_json(text: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(text).map_err(|e| TemplateError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate every placeholder; all offending leaves are reported.
    pub fn from_value(body: Value) -> Result<Self, TemplateError> {
        let mut issues = Vec::new();
        let mut uses_next_id = false;

        visit_strings(&body, "$", &mut |path, text| {
            for caps in PLACEHOLDER.captures_iter(text) {
                match Placeholder::parse(&caps[1], &caps[2]) {
                    Ok(Placeholder::NextId) => uses_next_id = true,
                    Ok(Placeholder::Row(_)) => {}
                    Err(message) => issues.push(PlaceholderIssue {
                        path: path.to_string(),
                        placeholder: caps[0].to_string(),
                        message,
                    }),
                }
            }
        });

        if !issues.is_empty() {
            return Err(TemplateError::Invalid(issues));
        }
        Ok(Self { body, entity_class: None, uses_next_id })
    }

    /// Entity class whose ID partition `{func.next_id}` draws from.
    pub fn with_entity_class(mut self, entity_class: impl Into<String>) -> Self {
        self.entity_class = Some(entity_class.into());
        self
    }

    pub fn entity_class(&self) -> Option<&str> {
        self.entity_class.as_deref()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn uses_next_id(&self) -> bool {
        self.uses_next_id
    }

    /// Every placeholder with the JSON path of its string leaf.
    pub fn placeholders(&self) -> Vec<(String, Placeholder)> {
        let mut found = Vec::new();
        visit_strings(&self.body, "$", &mut |path, text| {
            for caps in PLACEHOLDER.captures_iter(text) {
                if let Ok(p) = Placeholder::parse(&caps[1], &caps[2]) {
                    found.push((path.to_string(), p));
                }
            }
        });
        found
    }

    /// Distinct `{row.X}` column names, in order of first use.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for (_, placeholder) in self.placeholders() {
            if let Placeholder::Row(name) = placeholder {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
                    columns.push(name);
                }
            }
        }
        columns
    }
}

pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        format!("{parent}.{key}")
    } else {
        format!("{parent}[{key:?}]")
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn visit_strings<F: FnMut(&str, &str)>(value: &Value, path: &str, visit: &mut F) {
    match value {
        Value::String(text) => visit(path, text),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                visit_strings(item, &index_path(path, i), visit);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                visit_strings(item, &child_path(path, key), visit);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
