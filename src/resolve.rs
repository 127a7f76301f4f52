//! Turning the parameter table into a composite model.
//!
//! Every used argument row becomes either a literal or a slot in the shared
//! parameter vector. Rows whose `vary` cell names another parameter follow
//! the chain to its end: a fixed terminal is substituted as a literal, a free
//! terminal contributes one slot that every member of the chain shares.

use ndarray::Array1;
use std::collections::HashMap;

use crate::composite::{ArgBinding, CompositeModel, ModelState, Term};
use crate::error::{FitError, Result};
use crate::models::ModelRegistry;
use crate::parameters::{Bounds, ParameterKey, ParameterRow, VaryRule};
use crate::table::ParameterTable;

/// Label written to the `id` column of fixed rows.
pub const FIXED_LABEL: &str = "-";

/// One free parameter of the composite model.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeSlot {
    /// `pN` or `xN`
    pub label: String,
    /// The row whose `vary` is `y` and which owns the slot values.
    pub terminal: ParameterKey,
    pub guess: Option<f64>,
    pub bounds: Bounds,
    pub fitted: f64,
    pub error: f64,
}

/// What resolution decided for one used row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowRole {
    /// Substituted as a constant. `linked` rows reached the value through a
    /// chain and also get it written into their own guess cell.
    Fixed { value: f64, linked: bool },
    /// Bound to a slot of the parameter vector.
    Free { slot: usize },
}

/// Per-row outcome, addressed by the row's `#` value.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAnnotation {
    pub hashtag: usize,
    pub key: ParameterKey,
    pub label: String,
    pub role: RowRole,
}

impl RowAnnotation {
    /// Absolute table row (header is row 0).
    pub fn table_row(&self) -> usize {
        self.hashtag + 1
    }
}

/// Everything resolution produces.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub model: CompositeModel,
    pub slots: Vec<FreeSlot>,
    pub annotations: Vec<RowAnnotation>,
}

impl Resolution {
    /// Guess values in parameter-vector order.
    ///
    /// Fails with one error naming every slot whose terminal has no guess.
    pub fn initial_guess(&self) -> Result<Array1<f64>> {
        let missing: Vec<String> = self
            .slots
            .iter()
            .filter(|s| s.guess.is_none())
            .map(|s| s.label.clone())
            .collect();
        if !missing.is_empty() {
            return Err(FitError::MissingGuess { ids: missing });
        }
        Ok(self.slots.iter().filter_map(|s| s.guess).collect())
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.slots.iter().map(|s| s.bounds).collect()
    }

    /// Bundle the model with its guess, prior fitted and prior error vectors.
    pub fn into_state(self) -> Result<ModelState> {
        let guess = self.initial_guess()?;
        let bounds = self.bounds();
        Ok(ModelState {
            fitted: self.slots.iter().map(|s| s.fitted).collect(),
            errors: self.slots.iter().map(|s| s.error).collect(),
            guess,
            bounds,
            model: self.model,
        })
    }
}

/// A link chain ends at a row that is either fixed or free.
enum Terminal<'a> {
    Fixed(&'a ParameterRow),
    Free(&'a ParameterRow),
}

struct Resolver<'a> {
    table: &'a ParameterTable,
    slots: Vec<FreeSlot>,
    slot_by_terminal: HashMap<ParameterKey, usize>,
    annotations: Vec<RowAnnotation>,
    p_count: usize,
    x_count: usize,
}

impl<'a> Resolver<'a> {
    fn new(table: &'a ParameterTable) -> Self {
        Self {
            table,
            slots: Vec::new(),
            slot_by_terminal: HashMap::new(),
            annotations: Vec::new(),
            p_count: 0,
            x_count: 0,
        }
    }

    /// Follow `vary` links from `start` until a `y` or `n` row.
    fn terminal(&self, start: &'a ParameterRow) -> Result<Terminal<'a>> {
        let mut chain = vec![start.key()];
        let mut current = start;
        loop {
            match &current.vary {
                Some(VaryRule::Free) => return Ok(Terminal::Free(current)),
                Some(VaryRule::Fixed) => return Ok(Terminal::Fixed(current)),
                None => return Err(invalid_vary(current)),
                Some(VaryRule::Link(target)) => {
                    let next = self
                        .table
                        .active_row(&target.submodel, &target.arg)
                        .ok_or_else(|| FitError::UnresolvedReference {
                            from: current.key().to_string(),
                            target: target.clone(),
                        })?;
                    let key = next.key();
                    let seen = chain.contains(&key);
                    chain.push(key);
                    if seen {
                        return Err(FitError::CyclicDependency {
                            chain: chain.iter().map(ToString::to_string).collect(),
                        });
                    }
                    current = next;
                }
            }
        }
    }

    /// The slot owned by `terminal`, allocated on first visit.
    fn slot_for(&mut self, terminal: &ParameterRow, via_link: bool) -> usize {
        let key = terminal.key();
        if let Some(&slot) = self.slot_by_terminal.get(&key) {
            return slot;
        }

        let label = if via_link {
            self.x_count += 1;
            format!("x{}", self.x_count - 1)
        } else {
            self.p_count += 1;
            format!("p{}", self.p_count - 1)
        };
        log::debug!("slot {} -> {} ({})", self.slots.len(), label, key);

        self.slots.push(FreeSlot {
            label,
            terminal: key.clone(),
            guess: terminal.guess,
            bounds: Bounds::from_cells(terminal.min, terminal.max),
            fitted: terminal.fitted.unwrap_or(0.0),
            error: terminal.error.unwrap_or(0.0),
        });
        self.slot_by_terminal.insert(key, self.slots.len() - 1);
        self.slots.len() - 1
    }

    fn fixed_value(row: &ParameterRow) -> Result<f64> {
        row.guess.ok_or_else(|| FitError::MissingFixedValue {
            submodel: row.submodel.to_string(),
            arg: row.arg.clone(),
        })
    }

    fn annotate(&mut self, row: &ParameterRow, role: RowRole) {
        let label = match role {
            RowRole::Fixed { .. } => FIXED_LABEL.to_string(),
            RowRole::Free { slot } => self.slots[slot].label.clone(),
        };
        self.annotations.push(RowAnnotation {
            hashtag: row.hashtag,
            key: row.key(),
            label,
            role,
        });
    }

    fn bind(&mut self, row: &'a ParameterRow) -> Result<ArgBinding> {
        let role = match &row.vary {
            None => return Err(invalid_vary(row)),
            Some(VaryRule::Fixed) => RowRole::Fixed {
                value: Self::fixed_value(row)?,
                linked: false,
            },
            Some(VaryRule::Free) => RowRole::Free {
                slot: self.slot_for(row, false),
            },
            Some(VaryRule::Link(_)) => match self.terminal(row)? {
                Terminal::Fixed(end) => RowRole::Fixed {
                    value: Self::fixed_value(end)?,
                    linked: true,
                },
                Terminal::Free(end) => RowRole::Free {
                    slot: self.slot_for(end, true),
                },
            },
        };
        self.annotate(row, role);

        Ok(match role {
            RowRole::Fixed { value, .. } => ArgBinding::Literal(value),
            RowRole::Free { slot } => ArgBinding::Slot(slot),
        })
    }
}

fn invalid_vary(row: &ParameterRow) -> FitError {
    FitError::InvalidVary {
        submodel: row.submodel.to_string(),
        arg: row.arg.clone(),
        value: row.vary.as_ref().map(ToString::to_string).unwrap_or_default(),
    }
}

/// Build the composite model for every active submodel of `table`.
///
/// Submodels are visited in table order and their arguments in the order
/// the registered function declares them, so the slot order is stable for
/// a given table.
pub fn resolve(table: &ParameterTable, registry: &ModelRegistry) -> Result<Resolution> {
    let mut resolver = Resolver::new(table);
    let mut terms = Vec::new();

    for entry in table.submodels().iter().filter(|e| e.is_active()) {
        let function = registry.get(entry.id.name())?.clone();
        let mut bindings = Vec::with_capacity(function.args().len());
        for arg in function.args() {
            let row = entry
                .active_row(arg)
                .ok_or_else(|| FitError::MissingArgument {
                    submodel: entry.id.to_string(),
                    arg: arg.clone(),
                })?;
            bindings.push(resolver.bind(row)?);
        }
        terms.push(Term {
            submodel: entry.id.clone(),
            function,
            bindings,
        });
    }

    let labels = resolver.slots.iter().map(|s| s.label.clone()).collect();
    let model = CompositeModel::new(terms, labels)?;
    log::debug!(
        "resolved {} submodels into {}",
        model.terms().len(),
        model.signature()
    );

    Ok(Resolution {
        model,
        slots: resolver.slots,
        annotations: resolver.annotations,
    })
}
