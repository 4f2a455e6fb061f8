use std::path::PathBuf;

use routerecon_payload::{
    resolve, IdAllocator, IdSeed, Partition, ResolutionErrorKind, RowData, Session, Template,
};
use routerecon_recon::{ComparisonRow, Status};
use serde_json::{json, Map};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_template(name: &str) -> Template {
    let text = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    Template::from_json(&text).unwrap()
}

// -------------------------------------------------------------------------
// Allocator
// -------------------------------------------------------------------------

#[test]
fn seeded_allocator_sequence() {
    let mut ids = IdAllocator::from_seed(&IdSeed::new(41, 7));
    assert_eq!(ids.next(Partition::for_class("VQ")), 42);
    assert_eq!(ids.next(Partition::for_class("VQ")), 43);
    assert_eq!(ids.next(Partition::for_class("AgentGroup")), 8);
}

// -------------------------------------------------------------------------
// Templates
// -------------------------------------------------------------------------

#[test]
fn vq_template_scenario() {
    let template = Template::from_json(r#"{"name": "{row.VQ Name}_cfg", "id": "{func.next_id}"}"#)
        .unwrap()
        .with_entity_class("VQ");

    let mut ids = IdAllocator::starting_at(10, 1);
    let ok = resolve(&template, &RowData::from_iter([("VQ Name", "Sales")]), &mut ids);
    assert_eq!(ok.payload, json!({"name": "Sales_cfg", "id": 10}));
    assert!(ok.errors.is_empty());

    let missing = resolve(&template, &RowData::from_iter([("Site", "LON")]), &mut ids);
    assert_eq!(missing.payload["name"], "_cfg");
    assert_eq!(missing.errors.len(), 1);
    assert_eq!(missing.errors[0].kind, ResolutionErrorKind::MissingColumn);
    assert!(missing.errors[0].message.contains("VQ Name"));
}

#[test]
fn column_lookup_ignores_case() {
    let template = Template::from_json(r#"{"name": "{row.vq name}"}"#).unwrap();
    let mut ids = IdAllocator::starting_at(1, 1);
    let out = resolve(&template, &RowData::from_iter([("VQ Name", "Sales")]), &mut ids);
    assert_eq!(out.payload["name"], "Sales");
}

#[test]
fn fixture_template_from_comparison_rows() {
    let template = load_template("agent-group.template.json");
    assert_eq!(template.columns(), ["Concatenated Key", "Expression", "Ideal Expression"]);

    let mut attributes = Map::new();
    attributes.insert("Expression".into(), json!("SK_A>5 & SK_B>3"));
    attributes.insert("Ideal Expression".into(), json!("SK_A>8"));
    let cmp = ComparisonRow {
        identifier_value: "SK_A>5 & SK_B>3 SK_A>8".into(),
        status: Status::New,
        key: "sk_a>5&sk_b>3sk_a>8".into(),
        attributes,
        source: None,
        struck_through: false,
    };
    let rows = vec![RowData::from_comparison_row("SkillExpr", "Concatenated Key", &cmp)];

    let session = Session::from_seed(&IdSeed { vq: Some(900), other: Some(77) });
    let batch = session.resolve_batch(&template, &rows);

    assert!(batch.errors.is_empty(), "{:?}", batch.errors);
    assert_eq!(
        batch.payloads[0],
        json!({
            "type": "agentGroup",
            "id": 78,
            "key": "SK_A>5 & SK_B>3 SK_A>8",
            "unNormalizedExpression": "SK_A>5 & SK_B>3",
            "IdealExpression": "SK_A>8",
            "tags": ["routerecon", "ag-78"],
            "enabled": true
        })
    );
    assert_eq!(session.peek(Partition::Vq), 901);
}

#[test]
fn payload_key_order_follows_template() {
    let template = load_template("agent-group.template.json");
    let mut ids = IdAllocator::starting_at(1, 1);
    let row = RowData::from_iter([("Concatenated Key", "k")]).with_entity_class("Skill");
    let out = resolve(&template, &row, &mut ids);

    let keys: Vec<_> = out.payload.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["type", "id", "key", "unNormalizedExpression", "IdealExpression", "tags", "enabled"]);
    assert_eq!(out.errors.len(), 2);
}
