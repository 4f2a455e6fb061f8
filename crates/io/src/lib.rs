//! `routerecon-io`: everything that touches a file.
//!
//! Workbooks in (xlsx with strikethrough, CSV), reference API dumps in,
//! Metadata-sheet ID seeds, the named JSON template store, and the
//! comparison report out.

pub mod csv;
pub mod error;
pub mod metadata;
pub mod reference;
pub mod store;
pub mod xlsx;
pub mod xlsx_styles;

pub use error::IoError;
pub use metadata::{read_seed, MetadataLayout};
pub use reference::{load_reference, load_references, parse_items, ParsedReference};
pub use store::{JsonStore, SaveOutcome};

use std::path::Path;

use routerecon_engine::Workbook;

/// Load a workbook by extension: `.csv`/`.tsv`/`.txt` go through the CSV
/// reader as a single sheet named after the file stem, anything else through
/// calamine.
pub fn load_workbook(path: &Path) -> Result<Workbook, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Sheet1");
            let sheet = csv::import(path, name)?;
            Ok(Workbook::from_sheets(vec![sheet]))
        }
        _ => xlsx::import(path).map(|(workbook, _)| workbook),
    }
}
