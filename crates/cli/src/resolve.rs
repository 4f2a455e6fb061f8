//! `routerecon resolve`: template + rows → payloads.

use std::path::{Path, PathBuf};

use routerecon_io::{load_workbook, read_seed};
use routerecon_payload::{select_rows, IdSeed, Partition, RowData, Session, Template, TemplateResolutionError};
use serde::Serialize;
use serde_json::Value;

use crate::output::{emit_json, read_text};
use crate::{locate, CliError, Ctx};

pub(crate) struct ResolveArgs {
    pub template: PathBuf,
    pub rows: PathBuf,
    pub entity_class: Option<String>,
    pub seed_vq: Option<u64>,
    pub seed_other: Option<u64>,
    pub metadata: Option<PathBuf>,
    pub select: Vec<String>,
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    payloads: Vec<Value>,
    errors: Vec<TemplateResolutionError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    not_found: Vec<String>,
    next_ids: NextIds,
}

#[derive(Serialize)]
struct NextIds {
    vq: u64,
    other: u64,
}

pub(crate) fn cmd_resolve(ctx: &Ctx, args: ResolveArgs) -> Result<(), CliError> {
    let template_path = locate(&args.template, &ctx.settings.paths.template_dir);
    let mut template = Template::from_json(&read_text(&template_path)?).map_err(CliError::template)?;
    if let Some(class) = &args.entity_class {
        template = template.with_entity_class(class.clone());
    }

    let rows = parse_rows(&read_text(&args.rows)?, &args.rows)?;
    let identifiers = split_selection(&args.select);
    if !args.select.is_empty() && identifiers.is_empty() {
        return Err(CliError::args("--select names no identifiers"));
    }
    let (rows, not_found) = if identifiers.is_empty() { (rows, Vec::new()) } else { select_rows(&rows, &identifiers) };
    for id in &not_found {
        eprintln!("warning: no row with identifier '{id}'");
    }

    let (seed, seed_warnings) = build_seed(ctx, &args)?;
    let session = Session::from_seed(&seed);
    let batch = session.resolve_batch(&template, &rows);

    for error in &batch.errors {
        eprintln!("warning: {error}");
    }

    let recorded = batch.errors.len() + not_found.len() + seed_warnings;
    let out = ResolveOutput {
        payloads: batch.payloads,
        errors: batch.errors,
        not_found,
        next_ids: NextIds { vq: session.peek(Partition::Vq), other: session.peek(Partition::Other) },
    };
    emit_json(&out, args.output.is_none(), args.output.as_deref())?;

    eprintln!(
        "resolved {} payload(s), {} error(s); next VQ id {}, next other id {}",
        out.payloads.len(),
        out.errors.len(),
        out.next_ids.vq,
        out.next_ids.other
    );
    ctx.check_strict(recorded, "warning(s)")
}

/// Metadata sheet first, explicit `--seed-*` values on top.
fn build_seed(ctx: &Ctx, args: &ResolveArgs) -> Result<(IdSeed, usize), CliError> {
    let mut seed = IdSeed::default();
    let mut warnings = 0;

    if let Some(path) = &args.metadata {
        let book = load_workbook(path).map_err(CliError::io)?;
        let (found, seed_warnings) = read_seed(&book, &ctx.metadata_layout()?);
        for warning in &seed_warnings {
            eprintln!("warning: {warning}");
        }
        warnings = seed_warnings.len();
        seed.merge(&found);
    }
    if let Some(vq) = args.seed_vq {
        seed.vq = Some(vq);
    }
    if let Some(other) = args.seed_other {
        seed.other = Some(other);
    }
    log::info!("id seed: vq {:?}, other {:?}", seed.vq, seed.other);
    Ok((seed, warnings))
}

/// A JSON array of flat objects. Key order is kept, so the first key of
/// each object is the row identifier.
fn parse_rows(text: &str, path: &Path) -> Result<Vec<RowData>, CliError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CliError::data(format!("{}: invalid JSON: {e}", path.display())))?;
    let Value::Array(items) = value else {
        return Err(CliError::data(format!("{}: expected an array of row objects", path.display())));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(object) => Ok(RowData::from_json_object(object)),
            _ => Err(CliError::data(format!("{}: row {i} is not an object", path.display()))),
        })
        .collect()
}

fn split_selection(select: &[String]) -> Vec<String> {
    select
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_column_order() {
        let rows = parse_rows(r#"[{"VQ Name": "VQ_A", "Site": "PAR"}, {"VQ Name": "VQ_B"}]"#, Path::new("rows.json"))
            .ok()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identifier(), Some("VQ_A"));
        assert_eq!(rows[0].get("site"), Some("PAR"));
    }

    #[test]
    fn rows_must_be_objects() {
        let err = parse_rows(r#"[{"a": "1"}, 3]"#, Path::new("rows.json")).err().unwrap();
        assert!(err.message.contains("row 1"));
        assert!(parse_rows(r#"{"a": 1}"#, Path::new("rows.json")).is_err());
    }

    #[test]
    fn selection_splits_and_trims() {
        let select = vec!["VQ_A, VQ_B".to_string(), "VQ_C".to_string(), " ,".to_string()];
        assert_eq!(split_selection(&select), ["VQ_A", "VQ_B", "VQ_C"]);
    }
}
