//! CSV-backed control tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::{CellValue, MemoryTable, TableSource};
use crate::error::Result;

/// A control table loaded from CSV.
///
/// Cells are kept in memory; [`TableSource::flush`] writes them back to the
/// file the table was opened from.
#[derive(Debug, Clone)]
pub struct CsvTable {
    table: MemoryTable,
    path: Option<PathBuf>,
}

impl CsvTable {
    /// Open a CSV file. Writes are saved back to the same file on flush.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut table = Self::from_reader(file)?;
        table.path = Some(path);
        Ok(table)
    }

    /// Read CSV from any reader. Rows may be ragged; the parameter reader
    /// reports that as a malformed table.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            // The header row stays text even when a name looks numeric
            let row = if i == 0 {
                record.iter().map(CellValue::text).collect()
            } else {
                record.iter().map(CellValue::parse).collect()
            };
            rows.push(row);
        }

        Ok(Self {
            table: MemoryTable::from_rows(rows),
            path: None,
        })
    }

    /// Write the current cells as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        for row in self.table.rows() {
            csv_writer.write_record(row.iter().map(CellValue::as_text))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn as_memory(&self) -> &MemoryTable {
        &self.table
    }
}

impl TableSource for CsvTable {
    fn row_count(&self) -> usize {
        self.table.row_count()
    }

    fn read_row(&self, row: usize) -> Result<Vec<CellValue>> {
        self.table.read_row(row)
    }

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<()> {
        self.table.write_cell(row, col, value)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let file = File::create(path)?;
            self.write_to(file)?;
            log::debug!("saved parameter table to {}", path.display());
        }
        Ok(())
    }
}
