//! Reference data from disk: raw API item dumps or plain key → attributes
//! objects.

use std::collections::HashMap;
use std::path::Path;

use routerecon_payload::{IdSeed, Partition};
use routerecon_recon::{EntityConfig, ReconConfig, ReferenceLayout, ReferenceRecords};
use serde_json::{Map, Value};

use crate::error::IoError;

/// Reference records plus what was learned while reading them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReference {
    pub records: ReferenceRecords,
    /// Highest all-digit `id` seen.
    pub max_id: Option<u64>,
    pub warnings: Vec<String>,
}

/// Everything a recon config points at, keyed by entity class.
#[derive(Debug, Clone, Default)]
pub struct LoadedReferences {
    pub records: HashMap<String, ReferenceRecords>,
    /// Max IDs per partition across all classes.
    pub seed: IdSeed,
    pub warnings: Vec<String>,
}

/// Turn an API response (an array of items) into reference records.
///
/// Keys are kept as written (trimmed); the recon match key normalises both
/// sides alike. Items without a key or an id are skipped with a warning.
pub fn parse_items(json: &Value, layout: &ReferenceLayout) -> Result<ParsedReference, IoError> {
    let Value::Array(items) = json else {
        return Err(IoError::Reference("expected an array of items".into()));
    };

    let mut parsed = ParsedReference::default();
    for (index, item) in items.iter().enumerate() {
        let fields = match &layout.nested {
            Some(nested) => item.get(nested).and_then(Value::as_object),
            None => item.as_object(),
        };
        let Some(fields) = fields else {
            parsed.warnings.push(format!("item {index}: no '{}' object", layout.nested.as_deref().unwrap_or("")));
            continue;
        };

        let key = match fields.get(&layout.key_field).and_then(scalar_text) {
            Some(raw) => raw.trim().to_string(),
            None => String::new(),
        };
        if key.is_empty() {
            parsed.warnings.push(format!("item {index}: missing '{}'", layout.key_field));
            continue;
        }

        let Some(id) = fields.get(&layout.id_field).filter(|v| scalar_text(v).is_some()) else {
            parsed.warnings.push(format!("item {index} ('{key}'): missing '{}'", layout.id_field));
            continue;
        };

        let mut attributes = Map::new();
        attributes.insert("id".into(), id.clone());
        for name in &layout.attributes {
            if let Some(value) = fields.get(name) {
                attributes.insert(name.clone(), value.clone());
            }
        }

        observe_max(&mut parsed.max_id, id);
        parsed.records.push(key, attributes);
    }

    for warning in &parsed.warnings {
        log::warn!("{warning}");
    }
    log::info!("parsed {} reference item(s), max id {:?}", parsed.records.len(), parsed.max_id);
    Ok(parsed)
}

/// Read one entity's reference file. `base` is the directory relative
/// paths are resolved against.
pub fn load_reference(base: &Path, entity: &EntityConfig) -> Result<ParsedReference, IoError> {
    let path = base.join(&entity.reference);
    let text = std::fs::read_to_string(&path).map_err(|e| IoError::read(&path, e))?;
    let json: Value =
        serde_json::from_str(&text).map_err(|e| IoError::Json { path: path.clone(), message: e.to_string() })?;

    match &entity.layout {
        Some(layout) => parse_items(&json, layout),
        None => {
            let records =
                ReferenceRecords::from_json_value(&json).map_err(|e| IoError::Reference(format!("{}: {e}", path.display())))?;
            let mut max_id = None;
            for record in records.iter() {
                if let Some(id) = record.attributes.get("id") {
                    observe_max(&mut max_id, id);
                }
            }
            Ok(ParsedReference { records, max_id, warnings: Vec::new() })
        }
    }
}

/// Load every class of a recon config and fold the max IDs into a seed.
pub fn load_references(config: &ReconConfig, base: &Path) -> Result<LoadedReferences, IoError> {
    let mut loaded = LoadedReferences::default();
    for (class, entity) in &config.entities {
        let parsed = load_reference(base, entity)?;
        if let Some(max) = parsed.max_id {
            loaded.seed.observe_id(Partition::for_class(class), max);
        }
        loaded.warnings.extend(parsed.warnings.into_iter().map(|w| format!("{class}: {w}")));
        loaded.records.insert(class.clone(), parsed.records);
    }
    Ok(loaded)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn observe_max(max: &mut Option<u64>, id: &Value) {
    let parsed = scalar_text(id)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|text| text.parse::<u64>().ok());
    if let Some(id) = parsed {
        *max = Some(max.map_or(id, |current| current.max(id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_items() {
        let response = json!([
            {"data": {"name": "VQ Sales", "id": "101", "site": "PAR"}},
            {"data": {"name": "VQ\u{a0}Billing", "id": 205}},
            {"data": {"name": "VQ_Legacy", "id": "A-9"}},
        ]);
        let layout = ReferenceLayout { attributes: vec!["site".into()], ..ReferenceLayout::default() };
        let parsed = parse_items(&response, &layout).unwrap();

        let keys: Vec<_> = parsed.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["VQ Sales", "VQ\u{a0}Billing", "VQ_Legacy"]);
        assert_eq!(parsed.records.get("VQ Sales").unwrap().attributes, json!({"id": "101", "site": "PAR"}).as_object().unwrap().clone());
        assert_eq!(parsed.records.get("VQ\u{a0}Billing").unwrap().attributes["id"], 205);
        assert_eq!(parsed.max_id, Some(205));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn skips_incomplete_items() {
        let response = json!([
            {"data": {"id": "1"}},
            {"data": {"name": "AG_A"}},
            {"other": {}},
            {"data": {"name": "AG_B", "id": "4"}},
        ]);
        let parsed = parse_items(&response, &ReferenceLayout::default()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.warnings.len(), 3);
        assert!(parsed.warnings[1].contains("missing 'id'"));
        assert_eq!(parsed.max_id, Some(4));
    }

    #[test]
    fn flat_items_and_custom_fields() {
        let layout = ReferenceLayout {
            nested: None,
            key_field: "displayName".into(),
            id_field: "dbId".into(),
            attributes: Vec::new(),
        };
        let parsed = parse_items(&json!([{"displayName": "Team A", "dbId": 3}]), &layout).unwrap();
        assert_eq!(parsed.records.get("Team A").unwrap().attributes["id"], 3);
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            parse_items(&json!({"data": []}), &ReferenceLayout::default()),
            Err(IoError::Reference(_))
        ));
    }
}
