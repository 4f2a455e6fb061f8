use routerecon_engine::SourcePosition;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One reference entry: comparison key plus the attributes the reference
/// side knows about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRecord {
    pub key: String,
    pub attributes: Map<String, Value>,
}

/// Reference records of one entity class, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceRecords {
    records: Vec<ReferenceRecord>,
}

impl ReferenceRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, attributes: Map<String, Value>) {
        self.records.push(ReferenceRecord { key: key.into(), attributes });
    }

    /// Build from a JSON object. Object values become attributes; scalar
    /// values are taken as the record id (`{"VQ_Sales": "101"}` →
    /// `{"id": "101"}`); `null` yields no attributes.
    pub fn from_json_value(value: &Value) -> Result<Self, ReconError> {
        let Value::Object(entries) = value else {
            return Err(ReconError::ReferenceShape(format!(
                "expected an object of key → attributes, found {}",
                kind_of(value)
            )));
        };

        let mut records = Self::new();
        for (key, entry) in entries {
            let attributes = match entry {
                Value::Object(attrs) => attrs.clone(),
                Value::Null => Map::new(),
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    let mut attrs = Map::new();
                    attrs.insert("id".into(), entry.clone());
                    attrs
                }
                Value::Array(_) => {
                    return Err(ReconError::ReferenceShape(format!("key '{key}': arrays are not attributes")));
                }
            };
            records.push(key.clone(), attributes);
        }
        Ok(records)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record with exactly this key.
    pub fn get(&self, key: &str) -> Option<&ReferenceRecord> {
        self.records.iter().find(|r| r.key == key)
    }
}

impl FromIterator<(String, Map<String, Value>)> for ReferenceRecords {
    fn from_iter<T: IntoIterator<Item = (String, Map<String, Value>)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().map(|(key, attributes)| ReferenceRecord { key, attributes }).collect(),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Only in the workbook.
    New,
    /// Only in the reference data.
    Missing,
    Matched,
}

impl Status {
    /// Label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New in Sheet",
            Self::Missing => "Missing in Sheet",
            Self::Matched => "Matched",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Missing => write!(f, "missing"),
            Self::Matched => write!(f, "matched"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Extracted primary value, or the reference key for `Missing` rows.
    pub identifier_value: String,
    pub status: Status,
    /// Normalised comparison key.
    pub key: String,
    /// Workbook attributes, overlaid by reference attributes when matched.
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourcePosition>,
    pub struck_through: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Extracted,
    Reference,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extracted => write!(f, "extracted"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// A key seen more than once on one side. Recorded, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCollision {
    pub key: String,
    pub side: Side,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub new: usize,
    pub missing: usize,
    pub matched: usize,
    pub collisions: usize,
}

impl ReconSummary {
    pub fn from_rows(rows: &[ComparisonRow], collisions: usize) -> Self {
        let count = |status: Status| rows.iter().filter(|r| r.status == status).count();
        Self {
            total: rows.len(),
            new: count(Status::New),
            missing: count(Status::Missing),
            matched: count(Status::Matched),
            collisions,
        }
    }

    pub fn add(&mut self, other: &ReconSummary) {
        self.total += other.total;
        self.new += other.new;
        self.missing += other.missing;
        self.matched += other.matched;
        self.collisions += other.collisions;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub summary: ReconSummary,
    pub rows: Vec<ComparisonRow>,
    pub collisions: Vec<KeyCollision>,
}

impl Reconciliation {
    pub fn rows_with(&self, status: Status) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(move |r| r.status == status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassResult {
    pub entity_class: String,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub classes: Vec<ClassResult>,
}

impl ReconResult {
    pub fn class(&self, entity_class: &str) -> Option<&ClassResult> {
        self.classes.iter().find(|c| c.entity_class == entity_class)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}
