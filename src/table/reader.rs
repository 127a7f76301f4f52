//! Reading the control table into [`ParameterTable`].

use std::collections::HashMap;

use super::{columns, CellValue, TableSource};
use crate::error::{FitError, Result};
use crate::parameters::{ParameterRow, SubmodelId, VaryRule};

/// All rows of one submodel, grouped by argument in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmodelEntry {
    pub id: SubmodelId,
    args: Vec<(String, Vec<ParameterRow>)>,
}

impl SubmodelEntry {
    fn new(id: SubmodelId) -> Self {
        Self {
            id,
            args: Vec::new(),
        }
    }

    fn push(&mut self, row: ParameterRow) {
        match self.args.iter_mut().find(|(arg, _)| *arg == row.arg) {
            Some((_, rows)) => rows.push(row),
            None => self.args.push((row.arg.clone(), vec![row])),
        }
    }

    /// A submodel takes part in the model when any of its rows is in use.
    pub fn is_active(&self) -> bool {
        self.args
            .iter()
            .any(|(_, rows)| rows.iter().any(|r| r.active))
    }

    /// Every row recorded for `arg` (several rows may share one argument).
    pub fn rows(&self, arg: &str) -> Option<&[ParameterRow]> {
        self.args
            .iter()
            .find(|(a, _)| a == arg)
            .map(|(_, rows)| rows.as_slice())
    }

    /// The first row of `arg` marked `use == "y"`.
    pub fn active_row(&self, arg: &str) -> Option<&ParameterRow> {
        self.rows(arg)?.iter().find(|r| r.active)
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(a, _)| a.as_str())
    }
}

/// The control table as `submodel -> arg -> rows`, in table row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    submodels: Vec<SubmodelEntry>,
    index: HashMap<String, usize>,
}

/// Positions of the required columns in the header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnMap {
    pub submodel: usize,
    pub arg: usize,
    pub use_: usize,
    pub vary: usize,
    pub min: usize,
    pub max: usize,
    pub guess: usize,
    pub fitted: usize,
    pub error: usize,
    pub hashtag: usize,
    pub id: usize,
}

impl ColumnMap {
    /// Locate every required column, rejecting missing or duplicated names.
    pub(crate) fn from_header(header: &[String]) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            let mut hits = header
                .iter()
                .enumerate()
                .filter(|(_, h)| h.trim() == name)
                .map(|(i, _)| i);
            let first = hits.next().ok_or_else(|| FitError::MalformedTable {
                row: 0,
                reason: format!("missing column '{}'", name),
            })?;
            if hits.next().is_some() {
                return Err(FitError::MalformedTable {
                    row: 0,
                    reason: format!("duplicated column '{}'", name),
                });
            }
            Ok(first)
        };

        Ok(Self {
            submodel: find(columns::SUBMODEL)?,
            arg: find(columns::ARG)?,
            use_: find(columns::USE)?,
            vary: find(columns::VARY)?,
            min: find(columns::MIN)?,
            max: find(columns::MAX)?,
            guess: find(columns::GUESS)?,
            fitted: find(columns::FITTED)?,
            error: find(columns::ERROR)?,
            hashtag: find(columns::HASHTAG)?,
            id: find(columns::ID)?,
        })
    }

    pub(crate) fn read<T: TableSource + ?Sized>(table: &T) -> Result<Self> {
        if table.row_count() == 0 {
            return Err(FitError::MalformedTable {
                row: 0,
                reason: "table has no header row".to_string(),
            });
        }
        Self::from_header(&table.header()?)
    }
}

impl ParameterTable {
    /// Read the control table.
    ///
    /// The `#` column is rewritten with each data row's 0-based index, which
    /// later addresses the fitted/error write-back. Rows with a blank
    /// submodel are skipped. A malformed table is left untouched.
    pub fn read<T: TableSource + ?Sized>(table: &mut T) -> Result<Self> {
        let cols = ColumnMap::read(table)?;
        let width = table.header()?.len();

        let mut parsed = ParameterTable::default();
        for row in 1..table.row_count() {
            let cells = table.read_row(row)?;
            if cells.len() != width {
                return Err(FitError::MalformedTable {
                    row,
                    reason: format!("expected {} cells, found {}", width, cells.len()),
                });
            }

            let hashtag = row - 1;
            let submodel = cells[cols.submodel].as_text();
            if submodel.is_empty() {
                continue;
            }

            let parsed_row = parse_row(row, &cells, &cols, SubmodelId::new(submodel), hashtag)?;
            parsed.push(parsed_row);
        }

        // Renumber only once every row has parsed
        for row in 1..table.row_count() {
            table.write_cell(row, cols.hashtag, CellValue::Number((row - 1) as f64))?;
        }

        log::debug!(
            "read {} submodels from parameter table",
            parsed.submodels.len()
        );
        Ok(parsed)
    }

    fn push(&mut self, row: ParameterRow) {
        let key = row.submodel.as_str().to_string();
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.submodels.push(SubmodelEntry::new(row.submodel.clone()));
                self.index.insert(key, self.submodels.len() - 1);
                self.submodels.len() - 1
            }
        };
        self.submodels[idx].push(row);
    }

    /// Submodels in table order.
    pub fn submodels(&self) -> &[SubmodelEntry] {
        &self.submodels
    }

    pub fn submodel(&self, id: &str) -> Option<&SubmodelEntry> {
        self.index.get(id).map(|&i| &self.submodels[i])
    }

    /// Every row stored under (submodel, arg).
    pub fn rows(&self, submodel: &str, arg: &str) -> Option<&[ParameterRow]> {
        self.submodel(submodel)?.rows(arg)
    }

    /// The first `use == "y"` row for (submodel, arg).
    pub fn active_row(&self, submodel: &str, arg: &str) -> Option<&ParameterRow> {
        self.submodel(submodel)?.active_row(arg)
    }

    /// Mutable access to a row by its hashtag.
    pub(crate) fn row_mut(&mut self, hashtag: usize) -> Option<&mut ParameterRow> {
        self.submodels
            .iter_mut()
            .flat_map(|s| s.args.iter_mut())
            .flat_map(|(_, rows)| rows.iter_mut())
            .find(|r| r.hashtag == hashtag)
    }
}

fn parse_row(
    row: usize,
    cells: &[CellValue],
    cols: &ColumnMap,
    submodel: SubmodelId,
    hashtag: usize,
) -> Result<ParameterRow> {
    let number = |col: usize, name: &str| -> Result<Option<f64>> {
        match &cells[col] {
            CellValue::Empty => Ok(None),
            CellValue::Number(v) => Ok(Some(*v)),
            CellValue::Text(t) => match t.trim().parse::<f64>() {
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(FitError::MalformedTable {
                    row,
                    reason: format!("column '{}' holds non-numeric value '{}'", name, t),
                }),
            },
        }
    };

    let active = match cells[cols.use_].as_text().as_str() {
        "y" => true,
        "n" | "" => false,
        other => {
            return Err(FitError::MalformedTable {
                row,
                reason: format!("column 'use' must be 'y' or 'n', found '{}'", other),
            })
        }
    };

    let vary_text = cells[cols.vary].as_text();
    let vary = if vary_text.is_empty() {
        None
    } else {
        Some(VaryRule::parse(&vary_text).ok_or_else(|| FitError::MalformedTable {
            row,
            reason: format!("cannot parse vary value '{}'", vary_text),
        })?)
    };

    Ok(ParameterRow {
        submodel,
        arg: cells[cols.arg].as_text(),
        active,
        vary,
        min: number(cols.min, columns::MIN)?,
        max: number(cols.max, columns::MAX)?,
        guess: number(cols.guess, columns::GUESS)?,
        fitted: number(cols.fitted, columns::FITTED)?,
        error: number(cols.error, columns::ERROR)?,
        hashtag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryTable;

    fn header() -> Vec<&'static str> {
        columns::REQUIRED.to_vec()
    }

    // submodel, arg, use, vary, min, max, guess, fitted, error, #, id
    fn row(cells: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = cells.iter().map(|s| s.to_string()).collect();
        out.resize(11, String::new());
        out
    }

    #[test]
    fn test_groups_rows_by_submodel_and_arg() {
        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "y", "y", "0", "", "10"]));
        table.push_text_row(&row(&["Gauss#1", "c", "n", "y", "", "", "1"]));
        table.push_text_row(&row(&["", "", "", "", "", "", ""]));
        table.push_text_row(&row(&["Gauss#1", "c", "y", "n", "", "", "2"]));
        table.push_text_row(&row(&["Gauss#2", "A", "", "y", "", "", "3"]));

        let params = ParameterTable::read(&mut table).unwrap();
        assert_eq!(params.submodels().len(), 2);

        let g1 = params.submodel("Gauss#1").unwrap();
        assert!(g1.is_active());
        assert_eq!(g1.args().collect::<Vec<_>>(), vec!["A", "c"]);
        assert_eq!(params.rows("Gauss#1", "c").unwrap().len(), 2);

        let c = params.active_row("Gauss#1", "c").unwrap();
        assert_eq!(c.guess, Some(2.0));
        assert_eq!(c.vary, Some(VaryRule::Fixed));
        assert_eq!(c.hashtag, 3);

        assert!(!params.submodel("Gauss#2").unwrap().is_active());
        assert_eq!(params.rows("Gauss#1", "A").unwrap()[0].max, None);
    }

    #[test]
    fn test_rewrites_hashtag_column() {
        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "y", "y", "", "", "1", "", "", "77"]));
        table.push_text_row(&row(&["Gauss#1", "c", "y", "y", "", "", "1", "", "", "12"]));

        ParameterTable::read(&mut table).unwrap();
        assert_eq!(
            table.read_column("#").unwrap(),
            vec![CellValue::Number(0.0), CellValue::Number(1.0)]
        );
    }

    #[test]
    fn test_malformed_row_leaves_hashtags_alone() {
        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "y", "y", "", "", "1", "", "", "77"]));
        table.push_text_row(&row(&["Gauss#1", "c", "y", "y", "", "", "one", "", "", "12"]));

        assert!(matches!(
            ParameterTable::read(&mut table),
            Err(FitError::MalformedTable { row: 2, .. })
        ));
        assert_eq!(
            table.read_column("#").unwrap(),
            vec![CellValue::Number(77.0), CellValue::Number(12.0)]
        );
    }

    #[test]
    fn test_missing_column() {
        let mut table = MemoryTable::new(&["submodel", "arg", "use"]);
        let err = ParameterTable::read(&mut table).unwrap_err();
        match err {
            FitError::MalformedTable { row, reason } => {
                assert_eq!(row, 0);
                assert!(reason.contains("vary"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row() {
        let mut table = MemoryTable::new(&header());
        table.push_text_row(&["Gauss#1", "A", "y"]);
        assert!(matches!(
            ParameterTable::read(&mut table),
            Err(FitError::MalformedTable { row: 1, .. })
        ));
    }

    #[test]
    fn test_bad_cells() {
        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "y", "y", "", "", "ten"]));
        assert!(matches!(
            ParameterTable::read(&mut table),
            Err(FitError::MalformedTable { row: 1, .. })
        ));

        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "maybe", "y", "", "", "1"]));
        assert!(ParameterTable::read(&mut table).is_err());

        let mut table = MemoryTable::new(&header());
        table.push_text_row(&row(&["Gauss#1", "A", "y", "sometimes", "", "", "1"]));
        assert!(ParameterTable::read(&mut table).is_err());
    }
}
