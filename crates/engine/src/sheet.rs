use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellValue};
use crate::cell_id::CellRef;

/// One worksheet. Only populated cells are stored; keys are `(row, col)` so
/// iteration order is row-major.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(usize, usize), Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), cells: BTreeMap::new() }
    }

    /// Store a cell. Empty values are dropped so they never show up in scans.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if cell.value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        self.set_cell(row, col, Cell::new(value));
    }

    pub fn set_struck(&mut self, row: usize, col: usize, struck: bool) {
        if let Some(cell) = self.cells.get_mut(&(row, col)) {
            cell.struck_through = struck;
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn get_ref(&self, at: CellRef) -> Option<&Cell> {
        self.get(at.row, at.col)
    }

    /// Trimmed text of a cell, `None` when absent or blank.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col).and_then(Cell::text)
    }

    /// Populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (CellRef::new(row, col), cell))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Highest populated row index, if any.
    pub fn max_row(&self) -> Option<usize> {
        self.cells.keys().map(|&(row, _)| row).max()
    }

    /// Build a sheet from rows of strings; handy for tests and CSV input.
    pub fn from_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sheet = Sheet::new(name);
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                sheet.set_value(row, col, value.as_ref());
            }
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_row_major() {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(1, 0, "c");
        sheet.set_value(0, 2, "b");
        sheet.set_value(0, 0, "a");

        let order: Vec<String> = sheet.cells().map(|(_, c)| c.text().unwrap()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_values_are_not_stored() {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(0, 0, "x");
        sheet.set_value(0, 0, "");
        assert_eq!(sheet.cell_count(), 0);
    }

    #[test]
    fn from_rows_skips_blanks() {
        let sheet = Sheet::from_rows("S", vec![vec!["Name", "", "Skill"], vec!["VQ_A", "x", ""]]);
        assert_eq!(sheet.cell_count(), 4);
        assert_eq!(sheet.text(0, 2).as_deref(), Some("Skill"));
        assert_eq!(sheet.max_row(), Some(1));
    }
}
