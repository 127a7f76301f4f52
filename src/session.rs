//! A fitting session bound to one parameter table.
//!
//! The session reads the table, resolves it into a composite model, writes
//! the slot labels back into the `id` column, fits, and finally writes the
//! fitted values and their errors into every row that shares a slot.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::composite::ModelState;
use crate::config::FitConfig;
use crate::error::Result;
use crate::fit::{curve_fit, fake_sigma, residue, TieRange};
use crate::models::ModelRegistry;
use crate::resolve::{resolve, RowAnnotation, RowRole};
use crate::table::{CellValue, ColumnMap, ParameterTable, TableSource};

/// Summary of one fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    /// `f(x, p0, x0, ...)`
    pub signature: String,
    /// Slot labels in parameter-vector order.
    pub labels: Vec<String>,
    pub params: Array1<f64>,
    pub errors: Array1<f64>,
    pub covariance: Array2<f64>,
    /// `∫|y - f(x)| dx`
    pub residue: f64,
    pub iterations: usize,
    pub message: String,
}

/// Owns a table and drives the read, resolve, fit and write-back cycle.
pub struct FitSession<T: TableSource> {
    table: T,
    registry: ModelRegistry,
    config: FitConfig,
    parameters: Option<ParameterTable>,
    annotations: Vec<RowAnnotation>,
    state: Option<ModelState>,
}

impl<T: TableSource> FitSession<T> {
    /// A session with the built-in models and default settings.
    pub fn new(table: T) -> Self {
        Self::with_config(table, FitConfig::default())
    }

    pub fn with_config(table: T, config: FitConfig) -> Self {
        Self {
            table,
            registry: ModelRegistry::with_builtins(),
            config,
            parameters: None,
            annotations: Vec::new(),
            state: None,
        }
    }

    /// Replace the model registry.
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Register extra model functions at runtime.
    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut FitConfig {
        &mut self.config
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Edit the table between fits; the next `update_model` picks it up.
    pub fn table_mut(&mut self) -> &mut T {
        &mut self.table
    }

    pub fn into_table(self) -> T {
        self.table
    }

    /// The table as last read, if any.
    pub fn parameters(&self) -> Option<&ParameterTable> {
        self.parameters.as_ref()
    }

    /// The model built by the last `update_model` or `fit`.
    pub fn state(&self) -> Option<&ModelState> {
        self.state.as_ref()
    }

    /// Re-read the parameter table (rewriting its `#` column).
    pub fn get_parameters(&mut self) -> Result<&ParameterTable> {
        let parameters = ParameterTable::read(&mut self.table)?;
        Ok(self.parameters.insert(parameters))
    }

    /// Re-read the table and rebuild the composite model.
    ///
    /// The `id` column is cleared and refilled with each used row's slot
    /// label (`-` for fixed rows); fixed rows get `fitted = guess` and
    /// `error = 0`. Missing guesses are reported after the labels are
    /// written, so the offending ids can be found in the table.
    pub fn update_model(&mut self) -> Result<&ModelState> {
        self.state = None;
        self.annotations.clear();

        let parameters = ParameterTable::read(&mut self.table)?;
        let resolution = resolve(&parameters, &self.registry);
        self.parameters = Some(parameters);
        let resolution = resolution?;

        let cols = ColumnMap::read(&self.table)?;
        for row in 1..self.table.row_count() {
            self.table.write_cell(row, cols.id, CellValue::Empty)?;
        }
        for annotation in &resolution.annotations {
            self.write_annotation(&cols, annotation)?;
        }
        let annotations = resolution.annotations.clone();

        let state = resolution.into_state()?;
        self.annotations = annotations;
        log::info!(
            "model {} with {} free parameters: {}",
            state.model.signature(),
            state.model.parameter_count(),
            state.model
        );
        Ok(self.state.insert(state))
    }

    fn write_annotation(&mut self, cols: &ColumnMap, annotation: &RowAnnotation) -> Result<()> {
        let row = annotation.table_row();
        self.table
            .write_cell(row, cols.id, CellValue::text(annotation.label.as_str()))?;

        if let RowRole::Fixed { value, linked } = annotation.role {
            if linked {
                self.table.write_cell(row, cols.guess, value.into())?;
            }
            self.table.write_cell(row, cols.fitted, value.into())?;
            self.table.write_cell(row, cols.error, 0.0.into())?;

            if let Some(r) = self
                .parameters
                .as_mut()
                .and_then(|p| p.row_mut(annotation.hashtag))
            {
                if linked {
                    r.guess = Some(value);
                }
                r.fitted = Some(value);
                r.error = Some(0.0);
            }
        }
        Ok(())
    }

    /// Fit the table's model to `(x, y)`.
    ///
    /// Points between the x values of a tie range get σ divided by the
    /// range's factor. Every row bound to a slot, linked rows included,
    /// receives the slot's fitted value and error.
    pub fn fit(&mut self, x: &Array1<f64>, y: &Array1<f64>, ties: &[TieRange]) -> Result<FitReport> {
        let state = self.update_model()?.clone();
        log::info!(
            "fitting {} points, {} free parameters, {} tie ranges",
            x.len(),
            state.model.parameter_count(),
            ties.len()
        );

        let sigma = fake_sigma(x, self.config.global_sigma, ties);
        let result = curve_fit(
            &state.model,
            x,
            y,
            &state.guess,
            Some(&sigma),
            &state.bounds,
            &self.config.lm,
        )?;
        let residue = residue(&state.model, x, y, &result.params.to_vec())?;

        let cols = ColumnMap::read(&self.table)?;
        for annotation in &self.annotations {
            let RowRole::Free { slot } = annotation.role else {
                continue;
            };
            let (value, error) = (result.params[slot], result.errors[slot]);
            let row = annotation.table_row();
            self.table.write_cell(row, cols.fitted, value.into())?;
            self.table.write_cell(row, cols.error, error.into())?;
            if let Some(r) = self
                .parameters
                .as_mut()
                .and_then(|p| p.row_mut(annotation.hashtag))
            {
                r.fitted = Some(value);
                r.error = Some(error);
            }
        }

        if let Some(current) = self.state.as_mut() {
            current.fitted = result.params.clone();
            current.errors = result.errors.clone();
        }
        if self.config.save_after_fit {
            self.table.flush()?;
        }

        log::info!(
            "fit finished after {} iterations, residue {:.6e}: {}",
            result.iterations,
            residue,
            result.message
        );

        Ok(FitReport {
            signature: state.model.signature(),
            labels: state.model.labels().to_vec(),
            params: result.params,
            errors: result.errors,
            covariance: result.covariance,
            residue,
            iterations: result.iterations,
            message: result.message,
        })
    }
}
