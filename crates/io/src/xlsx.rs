// Excel workbook import (xlsx, xlsm, xls, ods) and comparison report export
//
// Import: values through calamine, strikethrough from the xlsx archive itself.
// Export: one "<Class> Comparison" sheet per entity class plus a Metadata
//         sheet holding the ID seeds for the next session.

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use routerecon_engine::{CellValue, Sheet, Workbook};
use routerecon_payload::{IdSeed, Partition, RowData};
use routerecon_recon::ReconResult;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet, XlsxError};

use crate::error::IoError;
use crate::metadata::MetadataLayout;
use crate::xlsx_styles;

/// Per-sheet import statistics
#[derive(Debug, Default, Clone)]
pub struct SheetStats {
    pub name: String,
    pub cells_imported: usize,
    pub struck_cells: usize,
}

/// Result of an Excel import operation
#[derive(Debug, Default)]
pub struct ImportResult {
    pub sheet_stats: Vec<SheetStats>,
    pub cells_imported: usize,
    pub struck_cells: usize,
    /// Actionable warnings (not boilerplate)
    pub warnings: Vec<String>,
    pub import_duration_ms: u128,
}

/// Excel's sheet-name length limit.
const MAX_SHEET_NAME: usize = 31;

// ============================================================================
// Import
// ============================================================================

pub fn import(path: &Path) -> Result<(Workbook, ImportResult), IoError> {
    let start_time = Instant::now();

    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::workbook(path, e))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IoError::workbook(path, "workbook contains no sheets"));
    }

    let mut result = ImportResult::default();
    let strikes = struck_cells(path, &sheet_names, &mut result.warnings);
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for (index, sheet_name) in sheet_names.iter().enumerate() {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| IoError::workbook(path, format!("failed to read sheet '{sheet_name}': {e}")))?;

        let mut sheet = Sheet::new(sheet_name.clone());
        let mut stats = SheetStats { name: sheet_name.clone(), ..Default::default() };

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, data) in row.iter().enumerate() {
                let value = cell_value(data);
                if value.is_empty() {
                    continue;
                }
                sheet.set_value(start_row as usize + row_idx, start_col as usize + col_idx, value);
                stats.cells_imported += 1;
            }
        }

        for &(row, col) in strikes.get(index).map(Vec::as_slice).unwrap_or_default() {
            if sheet.get(row, col).is_some() {
                sheet.set_struck(row, col, true);
                stats.struck_cells += 1;
            }
        }

        log::info!(
            "imported sheet '{}': {} cell(s), {} struck",
            sheet_name,
            stats.cells_imported,
            stats.struck_cells
        );
        result.cells_imported += stats.cells_imported;
        result.struck_cells += stats.struck_cells;
        result.sheet_stats.push(stats);
        sheets.push(sheet);
    }

    result.import_duration_ms = start_time.elapsed().as_millis();
    Ok((Workbook::from_sheets(sheets), result))
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(e.to_string()),
        // Serial number; rules match text, so dates compare as their serials.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

/// Strike positions for zip-based formats; legacy binary and ODS files carry
/// none.
fn struck_cells(path: &Path, sheet_names: &[String], warnings: &mut Vec<String>) -> Vec<Vec<(usize, usize)>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !matches!(ext.as_str(), "xlsx" | "xlsm") {
        log::debug!("{}: no strikethrough information for .{ext}", path.display());
        return Vec::new();
    }

    match xlsx_styles::read_struck_cells(path, sheet_names) {
        Ok(cells) => cells,
        Err(e) => {
            log::warn!("strikethrough not read: {e}");
            warnings.push(format!("strikethrough not read: {e}"));
            Vec::new()
        }
    }
}

// ============================================================================
// Export
// ============================================================================

/// Statistics from a comparison export
#[derive(Debug, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub rows_exported: usize,
}

/// Write the comparison report: a `<Class> Comparison` sheet per class,
/// then the Metadata sheet carrying `seed`.
pub fn export_comparison(path: &Path, recon: &ReconResult, seed: &IdSeed) -> Result<ExportResult, IoError> {
    export_comparison_with_layout(path, recon, seed, &MetadataLayout::default())
}

pub fn export_comparison_with_layout(
    path: &Path,
    recon: &ReconResult,
    seed: &IdSeed,
    layout: &MetadataLayout,
) -> Result<ExportResult, IoError> {
    let fail = |e: XlsxError| IoError::workbook(path, e);
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let bold = Format::new().set_bold();
    let struck = Format::new().set_font_strikethrough();

    for class in &recon.classes {
        let identifier = identifier_header(&class.entity_class);
        let rows: Vec<(RowData, bool)> = class
            .reconciliation
            .rows
            .iter()
            .map(|row| (RowData::from_comparison_row(&class.entity_class, &identifier, row), row.struck_through))
            .collect();

        let mut headers: Vec<String> = vec![identifier, routerecon_payload::STATUS_COLUMN.to_string()];
        for (row, _) in &rows {
            for name in row.column_names() {
                if !headers.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                    headers.push(name.to_string());
                }
            }
        }

        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(comparison_sheet_name(&class.entity_class))
            .map_err(fail)?;

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &bold).map_err(fail)?;
        }
        for (offset, (row, is_struck)) in rows.iter().enumerate() {
            let r = offset as u32 + 1;
            for (col, header) in headers.iter().enumerate() {
                let value = row.get(header).unwrap_or_default();
                if col == 0 && *is_struck {
                    worksheet.write_string_with_format(r, 0, value, &struck).map_err(fail)?;
                } else if !value.is_empty() {
                    worksheet.write_string(r, col as u16, value).map_err(fail)?;
                }
            }
        }

        result.rows_exported += rows.len();
        result.sheets_exported += 1;
    }

    let worksheet = xlsx_workbook.add_worksheet().set_name(&layout.sheet).map_err(fail)?;
    write_seed(worksheet, layout, seed).map_err(fail)?;
    result.sheets_exported += 1;

    xlsx_workbook.save(path).map_err(fail)?;
    log::info!(
        "wrote {} sheet(s), {} row(s) to {}",
        result.sheets_exported,
        result.rows_exported,
        path.display()
    );
    Ok(result)
}

fn write_seed(worksheet: &mut Worksheet, layout: &MetadataLayout, seed: &IdSeed) -> Result<(), XlsxError> {
    for (partition, at, label) in [
        (Partition::Vq, layout.vq_cell, "Max VQ ID"),
        (Partition::Other, layout.other_cell, "Max Other ID"),
    ] {
        let (row, col) = (at.row as u32, at.col as u16);
        if col > 0 {
            worksheet.write_string(row, col - 1, label)?;
        }
        let max = seed.get(partition).unwrap_or(routerecon_payload::ID_FLOOR);
        worksheet.write_number(row, col, max as f64)?;
    }
    Ok(())
}

fn identifier_header(entity_class: &str) -> String {
    format!("{entity_class} Name")
}

/// `<Class> Comparison`, shortened and cleaned to a legal sheet name.
fn comparison_sheet_name(entity_class: &str) -> String {
    const SUFFIX: &str = " Comparison";
    let cleaned: String = entity_class
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
        .take(MAX_SHEET_NAME - SUFFIX.len())
        .collect();
    format!("{}{SUFFIX}", cleaned.trim_matches('\''))
}
