use serde::{Deserialize, Serialize};

/// Raw value of a workbook cell, as delivered by the workbook loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Coerce to the trimmed string form used for matching.
    ///
    /// Integral numbers render without a fractional part, booleans as
    /// `TRUE`/`FALSE`. Returns `None` for empty or whitespace-only cells.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// A populated cell: value plus the formatting state the engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub struck_through: bool,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self { value: value.into(), struck_through: false }
    }

    pub fn struck(value: impl Into<CellValue>) -> Self {
        Self { value: value.into(), struck_through: true }
    }

    pub fn text(&self) -> Option<String> {
        self.value.as_text()
    }
}
