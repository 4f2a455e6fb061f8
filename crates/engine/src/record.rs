use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ExtractionWarning;

/// Attribute name carrying the strike flag in rendered attribute maps.
pub const STRIKE_ATTR: &str = "strike";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    /// A1 address, e.g. `B7`.
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubEntity {
    pub value: String,
    pub struck_through: bool,
}

/// One entity recognised in one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub entity_class: String,
    /// Field name the primary value is published under.
    pub primary_key: String,
    pub primary_value: String,
    pub struck_through: bool,
    pub additional_fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_entity_name: Option<String>,
    pub sub_entities: Vec<SubEntity>,
    pub constructed_fields: BTreeMap<String, String>,
    pub source: SourcePosition,
}

impl ExtractedRecord {
    /// Look up a named value: the primary field key, an additional field,
    /// or a constructed field, in that order.
    pub fn field(&self, name: &str) -> Option<&str> {
        if name == self.primary_key {
            return Some(&self.primary_value);
        }
        self.additional_fields
            .get(name)
            .or_else(|| self.constructed_fields.get(name))
            .map(String::as_str)
    }

    /// Excel-side attributes as shown next to reference data.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert(self.primary_key.clone(), Value::String(self.primary_value.clone()));
        attrs.insert(STRIKE_ATTR.to_string(), Value::Bool(self.struck_through));
        for (k, v) in &self.additional_fields {
            attrs.insert(k.clone(), Value::String(v.clone()));
        }
        for (k, v) in &self.constructed_fields {
            attrs.insert(k.clone(), Value::String(v.clone()));
        }
        if let Some(name) = &self.sub_entity_name {
            let subs = self
                .sub_entities
                .iter()
                .map(|s| {
                    let mut m = Map::new();
                    m.insert("value".into(), Value::String(s.value.clone()));
                    m.insert(STRIKE_ATTR.into(), Value::Bool(s.struck_through));
                    Value::Object(m)
                })
                .collect();
            attrs.insert(name.clone(), Value::Array(subs));
        }
        attrs
    }
}

// ---------------------------------------------------------------------------
// Extraction output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub records: Vec<ExtractedRecord>,
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    /// Entity classes in order of first appearance.
    pub fn classes(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for r in &self.records {
            if !seen.contains(&r.entity_class.as_str()) {
                seen.push(&r.entity_class);
            }
        }
        seen
    }

    /// Records of one class, in extraction order.
    pub fn records_for(&self, class: &str) -> Vec<&ExtractedRecord> {
        self.records.iter().filter(|r| r.entity_class == class).collect()
    }

    /// Records grouped per class, classes in order of first appearance.
    pub fn by_class(&self) -> Vec<(&str, Vec<&ExtractedRecord>)> {
        self.classes()
            .into_iter()
            .map(|class| (class, self.records_for(class)))
            .collect()
    }

    /// Count of records per class.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.entity_class.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn merge(&mut self, other: Extraction) {
        self.records.extend(other.records);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            entity_class: "SkillExpr".into(),
            primary_key: "expression".into(),
            primary_value: "SK_A & SK_B".into(),
            struck_through: true,
            additional_fields: BTreeMap::from([("desc".to_string(), "Both".to_string())]),
            sub_entity_name: Some("skills".into()),
            sub_entities: vec![SubEntity { value: "SK_A".into(), struck_through: true }],
            constructed_fields: BTreeMap::new(),
            source: SourcePosition { sheet: "S".into(), row: 0, col: 0, address: "A1".into() },
        }
    }

    #[test]
    fn field_lookup_order() {
        let r = record();
        assert_eq!(r.field("expression"), Some("SK_A & SK_B"));
        assert_eq!(r.field("desc"), Some("Both"));
        assert_eq!(r.field("missing"), None);
    }

    #[test]
    fn attributes_include_sub_entities() {
        let attrs = record().attributes();
        assert_eq!(attrs["expression"], "SK_A & SK_B");
        assert_eq!(attrs["strike"], true);
        assert_eq!(attrs["skills"][0]["value"], "SK_A");
        assert_eq!(attrs["skills"][0]["strike"], true);
    }
}
