//! Cell addressing in A1 notation.
//!
//! Rows and columns are 0-based internally; `CellRef` renders and parses the
//! 1-based letter/number form used in rule files (`"C"`, `"C2"`).

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A fixed cell position within one sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
}

impl CellRef {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = String;

    /// Parse `"B5"` into row 4, col 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("'{s}' is not a cell address"))?;
        let (letters, digits) = s.split_at(split);
        let col = letters_to_col(letters).ok_or_else(|| format!("'{s}' has no column letters"))?;
        let row: usize = digits
            .parse()
            .map_err(|_| format!("'{s}' has an invalid row number"))?;
        if row == 0 {
            return Err(format!("'{s}': rows start at 1"));
        }
        Ok(CellRef::new(row - 1, col))
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Columns in an xlsx sheet (`A` to `XFD`).
pub const MAX_COLS: usize = 16_384;

/// Convert column letters (`"A"`, `"aa"`) to a 0-based index. `None` past
/// column `XFD`.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut col: usize = 0;
    for ch in letters.chars() {
        let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > MAX_COLS {
            return None;
        }
    }
    Some(col - 1)
}
