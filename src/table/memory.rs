use super::{CellValue, TableSource};
use crate::error::{FitError, Result};

/// An in-memory grid of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    rows: Vec<Vec<CellValue>>,
}

impl MemoryTable {
    /// Create a table holding only a header row.
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        Self {
            rows: vec![header.iter().map(|h| CellValue::text(h.as_ref())).collect()],
        }
    }

    /// Create a table from raw rows; row 0 is the header.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Append a data row.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Append a data row written as spreadsheet text (numbers are detected).
    pub fn push_text_row<S: AsRef<str>>(&mut self, row: &[S]) {
        self.rows
            .push(row.iter().map(|c| CellValue::parse(c.as_ref())).collect());
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cell at (row, col); missing cells of a short row read as empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Result<CellValue> {
        let col = self.column_index(column)?;
        Ok(self.cell(row, col).cloned().unwrap_or_default())
    }
}

impl TableSource for MemoryTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn read_row(&self, row: usize) -> Result<Vec<CellValue>> {
        self.rows
            .get(row)
            .cloned()
            .ok_or(FitError::CellOutOfRange { row, col: 0 })
    }

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<()> {
        let width = self.rows.first().map_or(0, Vec::len);
        if col >= width {
            return Err(FitError::CellOutOfRange { row, col });
        }
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(FitError::CellOutOfRange { row, col })?;
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        Ok(())
    }
}
