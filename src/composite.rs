//! The composite model: a plain sum of submodel terms.
//!
//! Each term is a registered function plus one binding per declared
//! argument. A binding is either a literal (fixed parameters, or links that
//! end at a fixed parameter) or a slot in the shared parameter vector (free
//! parameters and everything linked to them).

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FitError, Result};
use crate::models::ModelFunction;
use crate::parameters::{Bounds, SubmodelId};

/// How one function argument receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ArgBinding {
    Literal(f64),
    Slot(usize),
}

impl ArgBinding {
    #[inline]
    fn value(&self, params: &[f64]) -> f64 {
        match *self {
            ArgBinding::Literal(v) => v,
            ArgBinding::Slot(i) => params[i],
        }
    }
}

/// One active submodel inside the composite model.
#[derive(Debug, Clone)]
pub struct Term {
    pub submodel: SubmodelId,
    pub function: ModelFunction,
    pub bindings: Vec<ArgBinding>,
}

impl Term {
    fn eval_into(&self, x: &Array1<f64>, params: &[f64], out: &mut Array1<f64>) {
        let args: Vec<f64> = self.bindings.iter().map(|b| b.value(params)).collect();
        for (xi, yi) in x.iter().zip(out.iter_mut()) {
            *yi += self.function.call(*xi, &args);
        }
    }
}

/// `f(x, p0, ..., pN) = Σ term_i(x)`.
#[derive(Debug, Clone, Default)]
pub struct CompositeModel {
    terms: Vec<Term>,
    labels: Vec<String>,
}

impl CompositeModel {
    /// Build a model from its terms and the labels of its parameter slots.
    pub fn new(terms: Vec<Term>, labels: Vec<String>) -> Result<Self> {
        let n = labels.len();
        for term in &terms {
            if term.bindings.len() != term.function.args().len() {
                return Err(FitError::DimensionMismatch(format!(
                    "submodel '{}' binds {} arguments, function '{}' expects {}",
                    term.submodel,
                    term.bindings.len(),
                    term.function.name(),
                    term.function.args().len()
                )));
            }
            if let Some(ArgBinding::Slot(i)) = term
                .bindings
                .iter()
                .find(|b| matches!(b, ArgBinding::Slot(i) if *i >= n))
            {
                return Err(FitError::DimensionMismatch(format!(
                    "submodel '{}' refers to slot {} but the model has {} parameters",
                    term.submodel, i, n
                )));
            }
        }
        Ok(Self { terms, labels })
    }

    /// Number of free parameter slots.
    pub fn parameter_count(&self) -> usize {
        self.labels.len()
    }

    /// Slot labels (`pN` / `xN`) in parameter-vector order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Index of the term for a submodel id such as `fwhmGauss#1`.
    pub fn term_index(&self, submodel: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.submodel.as_str() == submodel)
    }

    fn check_params(&self, params: &[f64]) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }

    /// Evaluate the sum of all terms.
    pub fn eval(&self, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>> {
        self.check_params(params)?;
        let mut out = Array1::zeros(x.len());
        for term in &self.terms {
            term.eval_into(x, params, &mut out);
        }
        Ok(out)
    }

    /// Evaluate a single term.
    pub fn eval_term(&self, index: usize, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>> {
        self.check_params(params)?;
        let term = self.terms.get(index).ok_or_else(|| {
            FitError::DimensionMismatch(format!(
                "term {} requested, model has {}",
                index,
                self.terms.len()
            ))
        })?;
        let mut out = Array1::zeros(x.len());
        term.eval_into(x, params, &mut out);
        Ok(out)
    }

    /// `f(x, p0, x0, p1)`
    pub fn signature(&self) -> String {
        let mut sig = String::from("f(x");
        for label in &self.labels {
            sig.push_str(", ");
            sig.push_str(label);
        }
        sig.push(')');
        sig
    }
}

/// Human-readable form, e.g. `fwhmGauss(x, p0, 2.5, p1) + Lorentz(x, x0, p2)`.
impl fmt::Display for CompositeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}(x", term.function.name())?;
            for binding in &term.bindings {
                match binding {
                    ArgBinding::Literal(v) => write!(f, ", {}", v)?,
                    ArgBinding::Slot(s) => write!(f, ", {}", self.labels[*s])?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// The guess and fit curves of one submodel.
#[derive(Debug, Clone)]
pub struct SubmodelCurves {
    pub submodel: SubmodelId,
    pub guess: Array1<f64>,
    pub fit: Array1<f64>,
}

/// A composite model with its guess, fitted and error vectors.
///
/// This is what `update_model` produces: enough to draw the pre-fit guess,
/// the post-fit result, and every submodel separately.
#[derive(Debug, Clone)]
pub struct ModelState {
    pub model: CompositeModel,
    pub guess: Array1<f64>,
    pub fitted: Array1<f64>,
    pub errors: Array1<f64>,
    pub bounds: Vec<Bounds>,
}

impl ModelState {
    /// Composite curve at the guess values.
    pub fn guess_curve(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.eval(x, &self.guess.to_vec())
    }

    /// Composite curve at the fitted values.
    pub fn fit_curve(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.eval(x, &self.fitted.to_vec())
    }

    fn term(&self, submodel: &str) -> Result<usize> {
        self.model
            .term_index(submodel)
            .ok_or_else(|| FitError::UnknownModel(submodel.to_string()))
    }

    /// One submodel at the guess values.
    pub fn submodel_guess(&self, submodel: &str, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.eval_term(self.term(submodel)?, x, &self.guess.to_vec())
    }

    /// One submodel at the fitted values.
    pub fn submodel_fit(&self, submodel: &str, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.eval_term(self.term(submodel)?, x, &self.fitted.to_vec())
    }

    /// Guess and fit curves for every active submodel, in table order.
    pub fn submodel_curves(&self, x: &Array1<f64>) -> Result<Vec<SubmodelCurves>> {
        let guess = self.guess.to_vec();
        let fitted = self.fitted.to_vec();
        (0..self.model.terms().len())
            .map(|i| {
                Ok(SubmodelCurves {
                    submodel: self.model.terms()[i].submodel.clone(),
                    guess: self.model.eval_term(i, x, &guess)?,
                    fit: self.model.eval_term(i, x, &fitted)?,
                })
            })
            .collect()
    }
}
