use std::collections::{BTreeMap, HashMap, HashSet};

use routerecon_engine::{ExtractedRecord, Extraction};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::key::MatchKey;
use crate::model::{
    ClassResult, ComparisonRow, KeyCollision, ReconMeta, ReconResult, ReconSummary, Reconciliation,
    ReferenceRecords, Side, Status,
};

/// Run reconciliation for every entity class in the config.
pub fn run(
    config: &ReconConfig,
    extraction: &Extraction,
    references: &HashMap<String, ReferenceRecords>,
) -> Result<ReconResult, ReconError> {
    let mut classes = Vec::with_capacity(config.entities.len());
    let mut summary = ReconSummary::default();

    for (class, entity) in &config.entities {
        let reference = references
            .get(class)
            .ok_or_else(|| ReconError::MissingReference(class.clone()))?;

        let records = extraction
            .records
            .iter()
            .filter(|r| r.entity_class == *class)
            .filter(|r| !(entity.skip_struck && r.struck_through));

        let reconciliation = reconcile_with(records, reference, &entity.match_key());
        log::info!(
            "{class}: {} matched, {} new, {} missing",
            reconciliation.summary.matched,
            reconciliation.summary.new,
            reconciliation.summary.missing
        );
        summary.add(&reconciliation.summary);
        classes.push(ClassResult { entity_class: class.clone(), reconciliation });
    }

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        classes,
    })
}

/// Reconcile with an arbitrary key projection. Reference keys are compared
/// verbatim, so `key_fn` must produce keys in the reference key space.
pub fn reconcile<'a, I, F>(extracted: I, reference: &ReferenceRecords, key_fn: F) -> Reconciliation
where
    I: IntoIterator<Item = &'a ExtractedRecord>,
    F: Fn(&ExtractedRecord) -> String,
{
    classify(extracted, reference, key_fn, |k| k.to_string())
}

/// Reconcile with a key policy applied to both sides.
pub fn reconcile_with<'a, I>(extracted: I, reference: &ReferenceRecords, key: &MatchKey) -> Reconciliation
where
    I: IntoIterator<Item = &'a ExtractedRecord>,
{
    classify(extracted, reference, |r| key.project(r), |k| key.normalize(k))
}

fn classify<'a, I, F, N>(extracted: I, reference: &ReferenceRecords, key_fn: F, reference_key: N) -> Reconciliation
where
    I: IntoIterator<Item = &'a ExtractedRecord>,
    F: Fn(&ExtractedRecord) -> String,
    N: Fn(&str) -> String,
{
    let reference_keys: Vec<String> = reference.iter().map(|r| reference_key(&r.key)).collect();
    let references: Vec<_> = reference.iter().collect();

    // First reference entry wins for attributes.
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut reference_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, key) in reference_keys.iter().enumerate() {
        index.entry(key.as_str()).or_insert(i);
        *reference_counts.entry(key.as_str()).or_insert(0) += 1;
    }

    let mut rows = Vec::new();
    let mut matched: HashSet<String> = HashSet::new();
    let mut extracted_counts: BTreeMap<String, usize> = BTreeMap::new();

    for record in extracted {
        let key = key_fn(record);
        *extracted_counts.entry(key.clone()).or_insert(0) += 1;

        let mut attributes = record.attributes();
        let status = match index.get(key.as_str()) {
            Some(&i) => {
                for (name, value) in &references[i].attributes {
                    attributes.insert(name.clone(), value.clone());
                }
                matched.insert(key.clone());
                Status::Matched
            }
            None => Status::New,
        };
        log::debug!("{} '{}' -> {status}", record.entity_class, record.primary_value);

        rows.push(ComparisonRow {
            identifier_value: record.primary_value.clone(),
            status,
            key,
            attributes,
            source: Some(record.source.clone()),
            struck_through: record.struck_through,
        });
    }

    for (entry, key) in references.iter().zip(&reference_keys) {
        if matched.contains(key) {
            continue;
        }
        rows.push(ComparisonRow {
            identifier_value: entry.key.clone(),
            status: Status::Missing,
            key: key.clone(),
            attributes: entry.attributes.clone(),
            source: None,
            struck_through: false,
        });
    }

    let mut collisions: Vec<KeyCollision> = extracted_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, count)| KeyCollision { key, side: Side::Extracted, count })
        .collect();
    collisions.extend(
        reference_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, count)| KeyCollision { key: key.to_string(), side: Side::Reference, count }),
    );
    for c in &collisions {
        log::warn!("key '{}' appears {} times on the {} side", c.key, c.count, c.side);
    }

    let summary = ReconSummary::from_rows(&rows, collisions.len());
    Reconciliation { summary, rows, collisions }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use routerecon_engine::SourcePosition;
    use serde_json::{json, Map, Value};

    fn record(class: &str, value: &str, row: usize) -> ExtractedRecord {
        ExtractedRecord {
            entity_class: class.into(),
            primary_key: "name".into(),
            primary_value: value.into(),
            struck_through: false,
            additional_fields: Default::default(),
            sub_entity_name: None,
            sub_entities: Vec::new(),
            constructed_fields: Default::default(),
            source: SourcePosition { sheet: "Queues".into(), row, col: 0, address: format!("A{}", row + 1) },
        }
    }

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn matched_and_new() {
        let extracted = vec![record("VQ", "VQ_Sales", 1), record("VQ", "VQ_Support", 2)];
        let reference: ReferenceRecords = [("VQ_Sales".to_string(), attrs(json!({"id": "101"})))].into_iter().collect();

        let result = reconcile(&extracted, &reference, |r| r.primary_value.clone());
        let statuses: Vec<_> = result.rows.iter().map(|r| (r.identifier_value.as_str(), r.status)).collect();
        assert_eq!(statuses, [("VQ_Sales", Status::Matched), ("VQ_Support", Status::New)]);
        assert_eq!(result.summary.matched, 1);
        assert_eq!(result.summary.new, 1);
        assert_eq!(result.summary.missing, 0);
    }

    #[test]
    fn missing_rows_follow_extracted_rows() {
        let extracted = vec![record("VQ", "VQ_B", 1)];
        let reference: ReferenceRecords = [
            ("VQ_A".to_string(), Map::new()),
            ("VQ_B".to_string(), Map::new()),
            ("VQ_C".to_string(), Map::new()),
        ]
        .into_iter()
        .collect();

        let result = reconcile(&extracted, &reference, |r| r.primary_value.clone());
        let order: Vec<_> = result.rows.iter().map(|r| (r.identifier_value.as_str(), r.status)).collect();
        assert_eq!(order, [("VQ_B", Status::Matched), ("VQ_A", Status::Missing), ("VQ_C", Status::Missing)]);
        assert!(result.rows[1].source.is_none());
    }

    #[test]
    fn reference_attributes_win() {
        let mut rec = record("VQ", "VQ_Sales", 1);
        rec.additional_fields.insert("site".into(), "LON".into());
        rec.additional_fields.insert("owner".into(), "ops".into());
        let reference: ReferenceRecords =
            [("VQ_Sales".to_string(), attrs(json!({"site": "PAR", "id": "101"})))].into_iter().collect();

        let result = reconcile([&rec], &reference, |r| r.primary_value.clone());
        let row = &result.rows[0];
        assert_eq!(row.attributes["site"], "PAR");
        assert_eq!(row.attributes["owner"], "ops");
        assert_eq!(row.attributes["id"], "101");
        assert_eq!(row.attributes["name"], "VQ_Sales");
    }

    #[test]
    fn duplicates_are_kept_and_recorded() {
        let extracted = vec![record("VQ", "VQ_Sales", 1), record("VQ", "VQ_Sales", 5)];
        let reference: ReferenceRecords =
            [("VQ_Sales".to_string(), Map::new()), ("VQ_Sales".to_string(), Map::new())].into_iter().collect();

        let result = reconcile(&extracted, &reference, |r| r.primary_value.clone());
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|r| r.status == Status::Matched));
        assert_eq!(
            result.collisions,
            [
                KeyCollision { key: "VQ_Sales".into(), side: Side::Extracted, count: 2 },
                KeyCollision { key: "VQ_Sales".into(), side: Side::Reference, count: 2 },
            ]
        );
        assert_eq!(result.summary.collisions, 2);
    }

    #[test]
    fn match_key_normalises_both_sides() {
        let extracted = vec![record("VQ", "VQ_ Sales", 1)];
        let reference: ReferenceRecords = [("vq_sales".to_string(), Map::new())].into_iter().collect();

        let loose = MatchKey { strip_whitespace: true, ..MatchKey::default() };
        let result = reconcile_with(&extracted, &reference, &loose);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].status, Status::Matched);
        assert_eq!(result.rows[0].identifier_value, "VQ_ Sales");

        let strict = MatchKey { case_insensitive: false, ..MatchKey::default() };
        let result = reconcile_with(&extracted, &reference, &strict);
        assert_eq!(result.summary.new, 1);
        assert_eq!(result.summary.missing, 1);
    }

    #[test]
    fn empty_inputs() {
        let result = reconcile(&Vec::<ExtractedRecord>::new(), &ReferenceRecords::new(), |r| r.primary_value.clone());
        assert!(result.rows.is_empty());
        assert_eq!(result.summary, ReconSummary::default());
    }

    proptest! {
        #[test]
        fn every_key_lands_in_exactly_one_category(
            extracted_keys in proptest::collection::vec("[a-d]{1,2}", 0..12),
            reference_keys in proptest::collection::vec("[a-d]{1,2}", 0..12),
        ) {
            let extracted: Vec<_> = extracted_keys.iter().enumerate().map(|(i, k)| record("VQ", k, i)).collect();
            let reference: ReferenceRecords =
                reference_keys.iter().map(|k| (k.clone(), Map::new())).collect();

            let result = reconcile(&extracted, &reference, |r| r.primary_value.clone());

            let distinct_extracted: HashSet<&String> = extracted_keys.iter().collect();
            let distinct_reference: HashSet<&String> = reference_keys.iter().collect();
            prop_assert!(result.rows.len() >= distinct_extracted.len().max(distinct_reference.len()));

            for key in distinct_extracted.union(&distinct_reference) {
                let statuses: HashSet<Status> =
                    result.rows.iter().filter(|r| &r.key == *key).map(|r| r.status).collect();
                prop_assert_eq!(statuses.len(), 1);
                let expected = match (distinct_extracted.contains(key), distinct_reference.contains(key)) {
                    (true, true) => Status::Matched,
                    (true, false) => Status::New,
                    _ => Status::Missing,
                };
                prop_assert!(statuses.contains(&expected));
            }
        }
    }
}
