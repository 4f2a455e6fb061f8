//! `routerecon-engine`: rule-driven entity extraction.
//!
//! Pure engine crate: receives an already-loaded workbook and a validated
//! rule set, returns extracted records plus recorded warnings.
//! No file or network IO.

pub mod cell;
pub mod cell_id;
pub mod construct;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod record;
pub mod replace;
pub mod rules;
pub mod sheet;
pub mod workbook;

pub use cell::{Cell, CellValue};
pub use error::{ExtractionWarning, RuleDefinitionError, RuleIssue, WarningKind};
pub use extract::{extract, extract_sheet};
pub use matcher::{match_cell, MatchResult};
pub use record::{ExtractedRecord, Extraction, SourcePosition, SubEntity};
pub use rules::RuleSet;
pub use sheet::Sheet;
pub use workbook::Workbook;
