//! Typed rule model.
//!
//! A `RuleSet` only exists in validated form: every regex compiled, every
//! name unique, every cell address parsed. Load through
//! [`RuleSet::from_json`] or [`RuleSet::from_value`].

mod validate;
pub mod wire;

use regex::Regex;

use crate::cell_id::CellRef;
use crate::construct::FormatSegment;
use crate::error::RuleDefinitionError;
use crate::replace::ReplaceRules;

pub use validate::validate_doc;

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub rules: Vec<EntityRule>,
    pub settings: GlobalSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Sheets skipped unless an enabled rule names them explicitly.
    pub default_skip_sheets: Vec<String>,
    /// Used when an identifier omits `checkForStrikethrough`.
    pub default_check_for_strikethrough: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_skip_sheets: wire::default_skip_sheets(),
            default_check_for_strikethrough: false,
        }
    }
}

impl RuleSet {
    pub fn from_json(input: &str) -> Result<Self, RuleDefinitionError> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| RuleDefinitionError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, RuleDefinitionError> {
        let doc: wire::RuleSetDoc =
            serde_json::from_value(value).map_err(|e| RuleDefinitionError::Json(e.to_string()))?;
        validate_doc(&doc)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &EntityRule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    pub fn rule(&self, name: &str) -> Option<&EntityRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Whether any enabled rule lists `sheet` in its `sheets` restriction.
    pub fn explicitly_includes(&self, sheet: &str) -> bool {
        self.enabled().any(|r| {
            r.sheets.as_ref().is_some_and(|s| s.iter().any(|n| n == sheet))
        })
    }

    pub fn is_skipped_sheet(&self, sheet: &str) -> bool {
        self.settings.default_skip_sheets.iter().any(|n| n == sheet)
    }

    /// Enabled rules that apply to `sheet`, in priority order.
    ///
    /// A globally skipped sheet stays skipped unless an enabled rule names
    /// it; then every rule that would run elsewhere runs there too.
    pub fn rules_for_sheet(&self, sheet: &str) -> Vec<&EntityRule> {
        let skipped = self.is_skipped_sheet(sheet) && !self.explicitly_includes(sheet);
        self.enabled()
            .filter(|r| match &r.sheets {
                Some(names) => names.iter().any(|n| n == sheet),
                None => !skipped,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Entity rule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EntityRule {
    pub name: String,
    pub enabled: bool,
    pub sheets: Option<Vec<String>>,
    pub identifier: Identifier,
    /// Output field name for the primary value.
    pub primary_field_key: String,
    pub replace_rules: ReplaceRules,
    pub additional_column: Option<AdditionalColumn>,
    pub sub_entities: Option<SubEntityRule>,
    pub construct_fields: Vec<ConstructField>,
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub pattern: IdentifierPattern,
    pub check_for_strikethrough: bool,
}

/// Closed set of identifier kinds.
#[derive(Debug, Clone)]
pub enum IdentifierPattern {
    StartsWith(Literal),
    Contains(Literal),
    ExactMatch(Literal),
    /// Search semantics: a match anywhere in the text counts.
    Regex(Regex),
}

/// Literal needle. Stored lowercased when `case_sensitive` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub needle: String,
    pub case_sensitive: bool,
}

impl Literal {
    pub fn new(value: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive { value.to_string() } else { value.to_lowercase() };
        Self { needle, case_sensitive }
    }
}

impl IdentifierPattern {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::StartsWith(_) => "startsWith",
            Self::Contains(_) => "contains",
            Self::ExactMatch(_) => "exactMatch",
            Self::Regex(_) => "regex",
        }
    }
}

// ---------------------------------------------------------------------------
// Extension blocks
// ---------------------------------------------------------------------------

/// Where to look for the header of the additional column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLocation {
    /// Column letter: header is read from the header row of that column.
    Column(usize),
    /// Fixed header cell: its column becomes the data column.
    HeaderCell(CellRef),
}

#[derive(Debug, Clone)]
pub struct AdditionalColumn {
    pub target_key: String,
    pub search_header: String,
    pub search_in: Vec<SearchLocation>,
    pub replace_rules: ReplaceRules,
    /// Data row = matched row + offset.
    pub row_offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubEntitySource {
    Primary,
    Additional,
}

#[derive(Debug, Clone)]
pub struct SubEntityRule {
    pub name: String,
    pub source: SubEntitySource,
    /// Exactly one capture group.
    pub regex: Regex,
    pub check_for_strikethrough: bool,
    pub replace_rules: ReplaceRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissingSource {
    SkipField,
    EmptyString,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConstructField {
    pub target_key: String,
    pub segments: Vec<FormatSegment>,
    pub on_missing: OnMissingSource,
}
