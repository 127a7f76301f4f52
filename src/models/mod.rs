//! Model functions and the registry that resolves submodel names.
//!
//! A submodel row such as `fwhmGauss#peak1` names a function by the text
//! before `#`. The registry maps those names to the function and its
//! declared argument list; the argument order is the order in which free
//! parameter slots are allocated for that submodel.

mod peak;
mod step;

pub use peak::{
    fwhm_area_gauss, fwhm_area_lorentz, fwhm_area_voigt, fwhm_gauss, fwhm_lorentz, fwhm_voigt,
    gauss, lorentz,
};
pub use step::{fwhm_arctan, fwhm_err, square};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{FitError, Result};

type ModelFn = dyn Fn(f64, &[f64]) -> f64 + Send + Sync;

/// A registered model function `f(x, args...)`.
#[derive(Clone)]
pub struct ModelFunction {
    name: String,
    args: Vec<String>,
    func: Arc<ModelFn>,
}

impl ModelFunction {
    pub fn new<F>(name: &str, args: &[&str], func: F) -> Self
    where
        F: Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments after the independent variable `x`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Evaluate at one point. `args` must follow the declared order.
    #[inline]
    pub fn call(&self, x: f64, args: &[f64]) -> f64 {
        (self.func)(x, args)
    }
}

impl fmt::Debug for ModelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFunction")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// Name -> function lookup used when assembling a composite model.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    functions: HashMap<String, ModelFunction>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in peak and step functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Gauss", &["A", "c", "w"], |x, p| gauss(x, p[0], p[1], p[2]));
        registry.register("fwhmGauss", &["A", "c", "w"], |x, p| {
            fwhm_gauss(x, p[0], p[1], p[2])
        });
        registry.register("fwhmAreaGauss", &["A", "c", "w"], |x, p| {
            fwhm_area_gauss(x, p[0], p[1], p[2])
        });
        registry.register("Lorentz", &["A", "c"], |x, p| lorentz(x, p[0], p[1]));
        registry.register("fwhmLorentz", &["A", "c", "w"], |x, p| {
            fwhm_lorentz(x, p[0], p[1], p[2])
        });
        registry.register("fwhmAreaLorentz", &["A", "c", "w"], |x, p| {
            fwhm_area_lorentz(x, p[0], p[1], p[2])
        });
        registry.register("fwhmVoigt", &["A", "c", "w", "m"], |x, p| {
            fwhm_voigt(x, p[0], p[1], p[2], p[3])
        });
        registry.register("fwhmAreaVoigt", &["A", "c", "w", "m"], |x, p| {
            fwhm_area_voigt(x, p[0], p[1], p[2], p[3])
        });
        registry.register("fwhmArctan", &["A", "c", "w"], |x, p| {
            fwhm_arctan(x, p[0], p[1], p[2])
        });
        registry.register("square", &["A", "c", "w"], |x, p| square(x, p[0], p[1], p[2]));
        registry.register("fwhmErr", &["A", "c", "w"], |x, p| fwhm_err(x, p[0], p[1], p[2]));
        registry
    }

    /// Register (or replace) a function under `name`.
    ///
    /// ```
    /// use sheetfit::models::ModelRegistry;
    ///
    /// let mut registry = ModelRegistry::new();
    /// registry.register("line", &["m", "b"], |x, p| p[0] * x + p[1]);
    /// assert_eq!(registry.get("line").unwrap().call(2.0, &[3.0, 1.0]), 7.0);
    /// ```
    pub fn register<F>(&mut self, name: &str, args: &[&str], func: F)
    where
        F: Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    {
        if self.functions.contains_key(name) {
            log::debug!("replacing model function '{}'", name);
        }
        self.functions
            .insert(name.to_string(), ModelFunction::new(name, args, func));
    }

    /// Look up a function by exact name.
    pub fn get(&self, name: &str) -> Result<&ModelFunction> {
        self.functions
            .get(name)
            .ok_or_else(|| FitError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
