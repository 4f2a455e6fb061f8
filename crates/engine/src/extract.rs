//! Entity extraction: walks sheets cell by cell and turns every cell that
//! satisfies a rule into an [`ExtractedRecord`].
//!
//! Iteration order is sheet → row → column → rule. The first rule whose
//! identifier matches claims the cell; later rules never see it.

use std::collections::{BTreeMap, HashMap};

use crate::cell_id::{col_to_letters, CellRef};
use crate::construct::render;
use crate::error::{ExtractionWarning, WarningKind};
use crate::matcher::match_cell;
use crate::record::{ExtractedRecord, Extraction, SourcePosition, SubEntity};
use crate::rules::{AdditionalColumn, EntityRule, OnMissingSource, RuleSet, SearchLocation, SubEntitySource};
use crate::sheet::Sheet;
use crate::workbook::Workbook;

/// Row holding column headers for column-letter search locations.
pub const HEADER_ROW: usize = 0;

/// Extract every sheet of a workbook.
pub fn extract(workbook: &Workbook, rules: &RuleSet) -> Extraction {
    let mut out = Extraction::default();
    for sheet in workbook.sheets() {
        out.merge(extract_sheet(sheet, rules));
    }
    log::info!(
        "extracted {} record(s) from {} sheet(s), {} warning(s)",
        out.records.len(),
        workbook.sheet_count(),
        out.warnings.len()
    );
    out
}

/// Extract one sheet.
pub fn extract_sheet(sheet: &Sheet, rules: &RuleSet) -> Extraction {
    let mut out = Extraction::default();
    let active = rules.rules_for_sheet(&sheet.name);
    if active.is_empty() {
        log::debug!("sheet '{}': no applicable rules, skipped", sheet.name);
        return out;
    }

    // Header resolution depends only on (sheet, rule), never on the matched row.
    let mut header_cache: HashMap<usize, Option<usize>> = HashMap::new();

    for (at, cell) in sheet.cells() {
        for (rule_idx, rule) in active.iter().enumerate() {
            let m = match_cell(cell, &rule.identifier);
            if !m.matched {
                continue;
            }
            log::debug!("{}!{}: '{}' claimed by rule '{}'", sheet.name, at, m.raw_value, rule.name);

            let ctx = CellCtx { sheet, at, rule, cell_struck: cell.struck_through };
            let record = build_record(&ctx, m.raw_value, m.struck_through, rule_idx, &mut header_cache, &mut out.warnings);
            out.records.push(record);
            break;
        }
    }

    log::info!("sheet '{}': {} record(s)", sheet.name, out.records.len());
    out
}

struct CellCtx<'a> {
    sheet: &'a Sheet,
    at: CellRef,
    rule: &'a EntityRule,
    cell_struck: bool,
}

impl CellCtx<'_> {
    fn warn(&self, warnings: &mut Vec<ExtractionWarning>, kind: WarningKind, message: String) {
        log::warn!("{}!{} [{}]: {}", self.sheet.name, self.at, self.rule.name, message);
        warnings.push(ExtractionWarning {
            kind,
            rule: self.rule.name.clone(),
            sheet: self.sheet.name.clone(),
            cell: self.at.to_string(),
            message,
        });
    }
}

fn build_record(
    ctx: &CellCtx<'_>,
    raw_value: String,
    struck_through: bool,
    rule_idx: usize,
    header_cache: &mut HashMap<usize, Option<usize>>,
    warnings: &mut Vec<ExtractionWarning>,
) -> ExtractedRecord {
    let rule = ctx.rule;
    let primary_value = rule.replace_rules.apply(&raw_value);

    let mut additional_fields = BTreeMap::new();
    let mut additional_value = None;
    if let Some(add) = &rule.additional_column {
        let data_col = *header_cache
            .entry(rule_idx)
            .or_insert_with(|| find_header_column(ctx.sheet, add));
        let value = fetch_additional(ctx, add, data_col, warnings);
        additional_fields.insert(add.target_key.clone(), value.clone());
        additional_value = Some(value);
    }

    let (sub_entity_name, sub_entities) = match &rule.sub_entities {
        Some(block) => {
            let source = match block.source {
                SubEntitySource::Primary => primary_value.as_str(),
                SubEntitySource::Additional => additional_value.as_deref().unwrap_or(""),
            };
            let strike = block.check_for_strikethrough && ctx.cell_struck;
            let subs: Vec<SubEntity> = block
                .regex
                .captures_iter(source)
                .filter_map(|caps| caps.get(1))
                .filter_map(|g| {
                    let cleaned = block.replace_rules.apply(g.as_str().trim());
                    (!cleaned.is_empty()).then_some(SubEntity { value: cleaned, struck_through: strike })
                })
                .collect();
            (Some(block.name.clone()), subs)
        }
        None => (None, Vec::new()),
    };

    let mut record = ExtractedRecord {
        entity_class: rule.name.clone(),
        primary_key: rule.primary_field_key.clone(),
        primary_value,
        struck_through,
        additional_fields,
        sub_entity_name,
        sub_entities,
        constructed_fields: BTreeMap::new(),
        source: SourcePosition {
            sheet: ctx.sheet.name.clone(),
            row: ctx.at.row,
            col: ctx.at.col,
            address: ctx.at.to_string(),
        },
    };

    for field in &rule.construct_fields {
        let rendered = render(&field.segments, &record.primary_value, |name| record.field(name));
        match (rendered, field.on_missing) {
            (Ok(value), _) => {
                record.constructed_fields.insert(field.target_key.clone(), value);
            }
            (Err(_), OnMissingSource::EmptyString) => {
                let value = render(&field.segments, &record.primary_value, |name| {
                    Some(record.field(name).unwrap_or(""))
                })
                .unwrap_or_default();
                record.constructed_fields.insert(field.target_key.clone(), value);
            }
            (Err(missing), OnMissingSource::SkipField) => {
                log::debug!("construct field '{}' skipped: no source '{}'", field.target_key, missing);
            }
            (Err(missing), OnMissingSource::Error) => ctx.warn(
                warnings,
                WarningKind::ConstructFieldMissingSource,
                format!("construct field '{}': missing source field '{}'", field.target_key, missing),
            ),
        }
    }

    record
}

/// Resolve the data column of the first search location whose header text
/// equals the wanted header, case-insensitively.
fn find_header_column(sheet: &Sheet, add: &AdditionalColumn) -> Option<usize> {
    add.search_in.iter().find_map(|loc| {
        let (header_at, data_col) = match *loc {
            SearchLocation::Column(col) => (CellRef::new(HEADER_ROW, col), col),
            SearchLocation::HeaderCell(at) => (at, at.col),
        };
        let header = sheet.text(header_at.row, header_at.col)?;
        (header.to_lowercase() == add.search_header.to_lowercase()).then_some(data_col)
    })
}

fn fetch_additional(
    ctx: &CellCtx<'_>,
    add: &AdditionalColumn,
    data_col: Option<usize>,
    warnings: &mut Vec<ExtractionWarning>,
) -> String {
    let Some(col) = data_col else {
        ctx.warn(
            warnings,
            WarningKind::HeaderNotFound,
            format!("header '{}' not found in {}", add.search_header, describe_locations(add)),
        );
        return String::new();
    };

    let target_row = ctx.at.row as i64 + add.row_offset;
    if target_row < 0 {
        ctx.warn(
            warnings,
            WarningKind::OffsetOutOfRange,
            format!("row offset {} points above the first row", add.row_offset),
        );
        return String::new();
    }
    let last_row = ctx.sheet.max_row().unwrap_or(0);
    if target_row as usize > last_row {
        ctx.warn(
            warnings,
            WarningKind::OffsetOutOfRange,
            format!("row offset {} points past the last row ({})", add.row_offset, last_row + 1),
        );
        return String::new();
    }

    let raw = ctx.sheet.text(target_row as usize, col).unwrap_or_default();
    add.replace_rules.apply(&raw)
}

fn describe_locations(add: &AdditionalColumn) -> String {
    add.search_in
        .iter()
        .map(|loc| match loc {
            SearchLocation::Column(col) => col_to_letters(*col),
            SearchLocation::HeaderCell(at) => at.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
