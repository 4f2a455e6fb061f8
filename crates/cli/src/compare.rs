//! `routerecon extract` and `routerecon compare`.

use std::path::{Path, PathBuf};

use routerecon_engine::{extract, Extraction, RuleSet};
use routerecon_io::{load_references, load_workbook, read_seed};
use routerecon_recon::{ReconConfig, ReconResult};
use serde::Serialize;

use crate::output::{emit_json, read_text};
use crate::{locate, CliError, Ctx};

pub(crate) struct CompareArgs {
    pub workbook: PathBuf,
    pub rules: PathBuf,
    pub recon: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
}

pub(crate) fn load_rules(ctx: &Ctx, path: &Path) -> Result<RuleSet, CliError> {
    let path = locate(path, &ctx.settings.paths.rules_dir);
    let text = read_text(&path)?;
    RuleSet::from_json(&text).map_err(CliError::rules)
}

fn run_extraction(ctx: &Ctx, workbook: &Path, rules: &Path) -> Result<(routerecon_engine::Workbook, Extraction), CliError> {
    let rules = load_rules(ctx, rules)?;
    let book = load_workbook(workbook).map_err(CliError::io)?;
    let extraction = extract(&book, &rules);

    for warning in &extraction.warnings {
        eprintln!("warning: {warning}");
    }
    Ok((book, extraction))
}

fn print_counts(extraction: &Extraction) {
    let counts = extraction.counts();
    let listed: Vec<String> = counts.iter().map(|(class, n)| format!("{n} {class}")).collect();
    eprintln!(
        "extracted {} record(s){}{}, {} warning(s)",
        extraction.records.len(),
        if listed.is_empty() { "" } else { ": " },
        listed.join(", "),
        extraction.warnings.len()
    );
}

// ============================================================================
// extract
// ============================================================================

pub(crate) fn cmd_extract(ctx: &Ctx, workbook: &Path, rules: &Path, json: bool, output: Option<&Path>) -> Result<(), CliError> {
    let (_, extraction) = run_extraction(ctx, workbook, rules)?;
    emit_json(&extraction, json, output)?;
    print_counts(&extraction);
    ctx.check_strict(extraction.warnings.len(), "extraction warning(s)")
}

// ============================================================================
// compare
// ============================================================================

#[derive(Serialize)]
struct CompareOutput<'a> {
    #[serde(flatten)]
    result: &'a ReconResult,
    warnings: Vec<String>,
}

pub(crate) fn cmd_compare(ctx: &Ctx, args: CompareArgs) -> Result<(), CliError> {
    let config_text = read_text(&args.recon)?;
    let config = ReconConfig::from_toml(&config_text).map_err(CliError::recon)?;

    let (book, extraction) = run_extraction(ctx, &args.workbook, &args.rules)?;
    print_counts(&extraction);

    // Reference paths resolve relative to the config file's directory
    let base_dir = args.recon.parent().unwrap_or_else(|| Path::new("."));
    let references = load_references(&config, base_dir).map_err(CliError::io)?;
    for warning in &references.warnings {
        eprintln!("warning: {warning}");
    }

    let result = routerecon_recon::run(&config, &extraction, &references.records).map_err(CliError::recon)?;

    if let Some(report) = &args.xlsx {
        let layout = ctx.metadata_layout()?;
        let mut seed = references.seed;
        if book.sheet(&layout.sheet).is_some() {
            let (previous, seed_warnings) = read_seed(&book, &layout);
            for warning in seed_warnings {
                eprintln!("warning: {warning}");
            }
            seed.merge(&previous);
        }
        routerecon_io::xlsx::export_comparison_with_layout(report, &result, &seed, &layout).map_err(CliError::io)?;
        eprintln!("wrote {}", report.display());
    }

    let mut warnings: Vec<String> = extraction.warnings.iter().map(|w| w.to_string()).collect();
    warnings.extend(references.warnings.iter().cloned());
    for class in &result.classes {
        for collision in &class.reconciliation.collisions {
            warnings.push(format!(
                "{}: key '{}' appears {} times on the {} side",
                class.entity_class, collision.key, collision.count, collision.side
            ));
        }
    }

    emit_json(&CompareOutput { result: &result, warnings: warnings.clone() }, args.json, args.output.as_deref())?;

    let s = &result.summary;
    eprintln!(
        "compared {} class(es): {} matched, {} new in sheet, {} missing in sheet, {} collision(s)",
        result.classes.len(),
        s.matched,
        s.new,
        s.missing,
        s.collisions
    );

    ctx.check_strict(warnings.len(), "warning(s)")
}
