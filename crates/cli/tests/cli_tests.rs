// Integration tests for the routerecon binary: exit codes and the --json
// stdout contract.
//
// Run with: cargo test -p routerecon-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures().join(name).to_str().unwrap().to_string()
}

/// A binary invocation isolated from the user's settings file.
fn routerecon(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_routerecon"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd.env("ROUTERECON_CONFIG", config_dir.join("settings.toml"));
    cmd
}

fn run(config_dir: &Path, args: &[&str]) -> Output {
    routerecon(config_dir).args(args).output().expect("run routerecon")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// stdout must be exactly one JSON value.
fn single_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty\nstderr: {}", stderr(output));
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "unexpected exit code\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        stderr(output)
    );
}

// ===========================================================================
// extract
// ===========================================================================

#[test]
fn extract_json_lists_records() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["extract", &fixture("queues.csv"), "--rules", &fixture("routing.rules.json"), "--json"],
    );
    assert_exit(&output, 0);

    let val = single_json(&output);
    let records = val["records"].as_array().expect("records must be an array");
    let names: Vec<&str> = records.iter().map(|r| r["primary_value"].as_str().unwrap()).collect();
    assert_eq!(names, ["VQ_Sales", "VQ_New"]);
    assert_eq!(records[0]["entity_class"], "VQ");
    assert_eq!(records[0]["additional_fields"]["site"], "LON");
    assert!(val["warnings"].as_array().unwrap().is_empty());
    assert!(stderr(&output).contains("extracted 2 record(s): 2 VQ"));
}

#[test]
fn extract_without_json_keeps_stdout_empty() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("extracted.json");
    let output = run(
        dir.path(),
        &[
            "extract",
            &fixture("queues.csv"),
            "--rules",
            &fixture("routing.rules.json"),
            "-o",
            out_file.to_str().unwrap(),
        ],
    );
    assert_exit(&output, 0);
    assert!(output.stdout.is_empty());

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(written["records"].as_array().unwrap().len(), 2);
}

#[test]
fn invalid_rules_exit_10() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["extract", &fixture("queues.csv"), "--rules", &fixture("broken.rules.json")],
    );
    assert_exit(&output, 10);
    assert!(stderr(&output).contains("rule #1 'Bad'"), "stderr: {}", stderr(&output));
}

#[test]
fn missing_workbook_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let output = run(
        dir.path(),
        &["extract", missing.to_str().unwrap(), "--rules", &fixture("routing.rules.json")],
    );
    assert_exit(&output, 3);
}

// ===========================================================================
// rules validate
// ===========================================================================

#[test]
fn rules_validate_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["rules", "validate", &fixture("routing.rules.json")]);
    assert_exit(&output, 0);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok: 1 rule(s), 1 enabled");

    let output = run(dir.path(), &["rules", "validate", &fixture("broken.rules.json")]);
    assert_exit(&output, 10);
}

// ===========================================================================
// compare
// ===========================================================================

#[test]
fn compare_json_classifies_rows() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &[
            "compare",
            &fixture("queues.csv"),
            "--rules",
            &fixture("routing.rules.json"),
            "--recon",
            &fixture("routing.recon.toml"),
            "--json",
        ],
    );
    assert_exit(&output, 0);

    let val = single_json(&output);
    assert_eq!(val["meta"]["config_name"], "CLI check");
    assert_eq!(val["summary"]["total"], 3);
    assert_eq!(val["summary"]["matched"], 1);
    assert_eq!(val["summary"]["new"], 1);
    assert_eq!(val["summary"]["missing"], 1);

    let class = &val["classes"][0];
    assert_eq!(class["entity_class"], "VQ");
    let rows: Vec<(&str, &str)> = class["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["identifier_value"].as_str().unwrap(), r["status"].as_str().unwrap()))
        .collect();
    assert!(rows.contains(&("VQ_Sales", "matched")), "rows: {rows:?}");
    assert!(rows.contains(&("VQ_New", "new")), "rows: {rows:?}");
    assert!(rows.contains(&("VQ_Gone", "missing")), "rows: {rows:?}");
    assert!(val["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn compare_writes_report_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.xlsx");
    let output = run(
        dir.path(),
        &[
            "compare",
            &fixture("queues.csv"),
            "--rules",
            &fixture("routing.rules.json"),
            "--recon",
            &fixture("routing.recon.toml"),
            "--xlsx",
            report.to_str().unwrap(),
        ],
    );
    assert_exit(&output, 0);
    assert!(report.exists());

    // The report's Metadata sheet seeds the next resolve: max VQ id was 140.
    let output = run(
        dir.path(),
        &[
            "resolve",
            "--template",
            &fixture("vq.template.json"),
            "--rows",
            &fixture("rows.json"),
            "--entity-class",
            "VQ",
            "--metadata",
            report.to_str().unwrap(),
        ],
    );
    assert_exit(&output, 0);
    let val = single_json(&output);
    assert_eq!(val["payloads"][0]["id"], 141);
}

#[test]
fn invalid_recon_config_exits_12() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &[
            "compare",
            &fixture("queues.csv"),
            "--rules",
            &fixture("routing.rules.json"),
            "--recon",
            &fixture("broken.recon.toml"),
        ],
    );
    assert_exit(&output, 12);
}

#[test]
fn strict_collisions_exit_20_after_output() {
    let dir = tempfile::tempdir().unwrap();
    let args = [
        "compare",
        &fixture("duplicated.csv"),
        "--rules",
        &fixture("routing.rules.json"),
        "--recon",
        &fixture("routing.recon.toml"),
        "--json",
    ];

    let relaxed = run(dir.path(), &args);
    assert_exit(&relaxed, 0);
    let val = single_json(&relaxed);
    assert_eq!(val["summary"]["collisions"], 1);
    assert_eq!(val["warnings"].as_array().unwrap().len(), 1);

    let mut strict_args = args.to_vec();
    strict_args.push("--strict");
    let strict = run(dir.path(), &strict_args);
    assert_exit(&strict, 20);
    // The JSON is still complete.
    assert_eq!(single_json(&strict)["summary"]["collisions"], 1);
}

// ===========================================================================
// resolve
// ===========================================================================

#[test]
fn resolve_draws_ids_after_seed() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &[
            "resolve",
            "--template",
            &fixture("vq.template.json"),
            "--rows",
            &fixture("rows.json"),
            "--entity-class",
            "VQ",
            "--seed-vq",
            "41",
        ],
    );
    assert_exit(&output, 0);

    let val = single_json(&output);
    assert_eq!(
        val["payloads"][0],
        serde_json::json!({"id": 42, "name": "VQ_New", "site": "PAR", "tags": ["vq-42"]})
    );
    assert_eq!(val["payloads"][1]["id"], 43);
    assert_eq!(val["nextIds"]["vq"], 44);
    assert_eq!(val["nextIds"]["other"], 1);
    assert!(val["errors"].as_array().unwrap().is_empty());
}

#[test]
fn resolve_selection_reports_unknown_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &[
            "resolve",
            "--template",
            &fixture("vq.template.json"),
            "--rows",
            &fixture("rows.json"),
            "--entity-class",
            "AgentGroup",
            "--seed-other",
            "9",
            "--select",
            "VQ_Other,VQ_Missing",
        ],
    );
    assert_exit(&output, 0);

    let val = single_json(&output);
    let payloads = val["payloads"].as_array().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["name"], "VQ_Other");
    assert_eq!(payloads[0]["id"], 10);
    assert_eq!(val["notFound"], serde_json::json!(["VQ_Missing"]));
}

#[test]
fn invalid_template_exits_11() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["resolve", "--template", &fixture("broken.template.json"), "--rows", &fixture("rows.json")],
    );
    assert_exit(&output, 11);
    assert!(stderr(&output).contains("unknown function 'random'"), "stderr: {}", stderr(&output));
}

#[test]
fn strict_resolution_errors_exit_20() {
    let dir = tempfile::tempdir().unwrap();
    // No entity class: {func.next_id} has no partition.
    let output = run(
        dir.path(),
        &[
            "resolve",
            "--template",
            &fixture("vq.template.json"),
            "--rows",
            &fixture("rows.json"),
            "--strict",
        ],
    );
    assert_exit(&output, 20);
    let val = single_json(&output);
    assert!(!val["errors"].as_array().unwrap().is_empty());
}

// ===========================================================================
// templates
// ===========================================================================

#[test]
fn template_store_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("templates");
    std::fs::write(
        dir.path().join("settings.toml"),
        format!("[paths]\ntemplateDir = {:?}\n", store.to_str().unwrap()),
    )
    .unwrap();

    let saved = run(dir.path(), &["templates", "save", "vq-update", &fixture("vq.template.json")]);
    assert_exit(&saved, 0);
    assert!(stderr(&saved).contains("created vq-update.json"));
    assert!(store.join("vq-update.json").exists());

    let again = run(dir.path(), &["templates", "save", "vq-update.json", &fixture("vq.template.json")]);
    assert_exit(&again, 0);
    assert!(stderr(&again).contains("updated vq-update.json"));

    let listed = run(dir.path(), &["templates", "list"]);
    assert_exit(&listed, 0);
    assert_eq!(String::from_utf8_lossy(&listed.stdout).trim(), "vq-update.json");

    let shown = run(dir.path(), &["templates", "show", "vq-update"]);
    assert_exit(&shown, 0);
    assert_eq!(single_json(&shown)["id"], "{func.next_id}");

    // Stored names resolve through the template directory.
    let resolved = run(
        dir.path(),
        &["resolve", "--template", "vq-update.json", "--rows", &fixture("rows.json"), "--entity-class", "VQ"],
    );
    assert_exit(&resolved, 0);
    assert_eq!(single_json(&resolved)["payloads"][0]["id"], 1);

    let broken = run(dir.path(), &["templates", "save", "broken", &fixture("broken.template.json")]);
    assert_exit(&broken, 11);
    assert!(!store.join("broken.json").exists());

    assert_exit(&run(dir.path(), &["templates", "delete", "vq-update"]), 0);
    assert_exit(&run(dir.path(), &["templates", "delete", "vq-update"]), 3);
    assert_exit(&run(dir.path(), &["templates", "save", "../escape", &fixture("vq.template.json")]), 2);
}
