use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// Ordered collection of sheets as loaded from a workbook file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Exact-name lookup, falling back to a case-insensitive match.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_exact_name() {
        let wb = Workbook::from_sheets(vec![Sheet::new("metadata"), Sheet::new("Metadata")]);
        assert_eq!(wb.sheet("Metadata").map(|s| s.name.as_str()), Some("Metadata"));
        assert_eq!(wb.sheet("METADATA").map(|s| s.name.as_str()), Some("metadata"));
        assert!(wb.sheet("Other").is_none());
    }
}
