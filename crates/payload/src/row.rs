use routerecon_recon::ComparisonRow;
use serde::Serialize;
use serde_json::{Map, Value};

/// Column name under which a comparison row's status is published.
pub const STATUS_COLUMN: &str = "Status";

/// Ordered `(column, value)` pairs with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowData {
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_class: Option<String>,
    columns: Vec<(String, String)>,
}

impl RowData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_class(mut self, entity_class: impl Into<String>) -> Self {
        self.entity_class = Some(entity_class.into());
        self
    }

    pub fn entity_class(&self) -> Option<&str> {
        self.entity_class.as_deref()
    }

    /// Set a column. A column already present under any casing is overwritten
    /// in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.position(&column) {
            Some(i) => self.columns[i].1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Case-insensitive lookup; an exact-case match wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.position(column).map(|i| self.columns[i].1.as_str())
    }

    fn position(&self, column: &str) -> Option<usize> {
        let column = column.trim();
        if let Some(i) = self.columns.iter().position(|(c, _)| c == column) {
            return Some(i);
        }
        let folded = column.to_lowercase();
        self.columns.iter().position(|(c, _)| c.to_lowercase() == folded)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Value of the first column.
    pub fn identifier(&self) -> Option<&str> {
        self.columns.first().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Flatten a comparison row: identifier column first, then `Status`,
    /// then each attribute.
    pub fn from_comparison_row(entity_class: &str, identifier_column: &str, row: &ComparisonRow) -> Self {
        let mut data = Self::new().with_entity_class(entity_class);
        data.insert(identifier_column, row.identifier_value.clone());
        data.insert(STATUS_COLUMN, row.status.label());
        for (name, value) in &row.attributes {
            data.insert(name.clone(), stringify(value));
        }
        data
    }

    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        object.iter().map(|(k, v)| (k.clone(), stringify(v))).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

/// Cell text for a JSON value. Sub-entity lists render as their values
/// joined by `", "`.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => map.get("value").map(stringify).unwrap_or_default(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
