//! Tabular backing stores and the parameter table reader.
//!
//! The fit logic never talks to a spreadsheet directly. It reads a snapshot
//! through [`TableSource`] and writes single cells back through the same
//! trait, so any grid (in memory, CSV, a live spreadsheet binding) can drive
//! a fit.

#[cfg(feature = "csv-table")]
mod csv;
mod memory;
mod reader;

#[cfg(feature = "csv-table")]
pub use self::csv::CsvTable;
pub use memory::MemoryTable;
pub use reader::{ParameterTable, SubmodelEntry};
pub(crate) use reader::ColumnMap;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FitError, Result};

/// Column names the control table must carry.
pub mod columns {
    pub const SUBMODEL: &str = "submodel";
    pub const ARG: &str = "arg";
    pub const USE: &str = "use";
    pub const VARY: &str = "vary";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const GUESS: &str = "guess";
    pub const FITTED: &str = "fitted";
    pub const ERROR: &str = "error";
    pub const HASHTAG: &str = "#";
    pub const ID: &str = "id";

    pub const REQUIRED: [&str; 11] = [
        SUBMODEL, ARG, USE, VARY, MIN, MAX, GUESS, FITTED, ERROR, HASHTAG, ID,
    ];
}

/// The value of one table cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a text cell; blank text becomes [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Interpret free-form text the way a spreadsheet would: numbers become
    /// numbers, blanks become empty, everything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Trimmed text content; numbers are formatted, empty cells give `""`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(v) => format_number(*v),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

// Integral values print without a trailing ".0" so hashtags read as 0, 1, 2.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// A 2D grid of cells addressed by (row, column), row 0 being the header.
pub trait TableSource {
    /// Number of rows, header included.
    fn row_count(&self) -> usize;

    /// Read one full row.
    fn read_row(&self, row: usize) -> Result<Vec<CellValue>>;

    /// Overwrite a single cell.
    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<()>;

    /// Column names from row 0.
    fn header(&self) -> Result<Vec<String>> {
        Ok(self.read_row(0)?.iter().map(CellValue::as_text).collect())
    }

    /// Index of a named column.
    fn column_index(&self, name: &str) -> Result<usize> {
        self.header()?
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FitError::ColumnNotFound(name.to_string()))
    }

    /// All data cells (below the header) of a named column.
    fn read_column(&self, name: &str) -> Result<Vec<CellValue>> {
        let col = self.column_index(name)?;
        (1..self.row_count())
            .map(|row| {
                let cells = self.read_row(row)?;
                Ok(cells.get(col).cloned().unwrap_or_default())
            })
            .collect()
    }

    /// Persist written cells. In-memory tables have nothing to do.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
