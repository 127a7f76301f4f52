//! Problem definition trait and the weighted curve-fitting problem.
//!
//! The `Problem` trait is a nonlinear least squares problem as the
//! Levenberg-Marquardt solver sees it: a residual vector and its Jacobian.
//! [`CurveFitProblem`] adapts a [`CurveModel`] with data, σ weights and box
//! bounds to that interface.

use ndarray::{Array1, Array2};

use crate::composite::CompositeModel;
use crate::error::{FitError, Result};
use crate::parameters::BoundsTransform;

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether `jacobian` is analytical. If false the solver computes the
    /// finite-difference Jacobian itself with its configured step.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Sum of squared residuals.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// Something that can be fitted to `y(x)`: a function of `x` and a flat
/// parameter vector.
pub trait CurveModel {
    fn parameter_count(&self) -> usize;

    fn eval(&self, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>>;
}

impl CurveModel for CompositeModel {
    fn parameter_count(&self) -> usize {
        CompositeModel::parameter_count(self)
    }

    fn eval(&self, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>> {
        CompositeModel::eval(self, x, params)
    }
}

/// A [`CurveModel`] from a closure evaluated point by point.
///
/// ```
/// use ndarray::array;
/// use sheetfit::problem::{CurveModel, FnModel};
///
/// let line = FnModel::new(2, |x, p| p[0] * x + p[1]);
/// assert_eq!(line.eval(&array![1.0, 2.0], &[3.0, 1.0]).unwrap(), array![4.0, 7.0]);
/// ```
pub struct FnModel<F> {
    n_params: usize,
    func: F,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    pub fn new(n_params: usize, func: F) -> Self {
        Self { n_params, func }
    }
}

impl<F> CurveModel for FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    fn parameter_count(&self) -> usize {
        self.n_params
    }

    fn eval(&self, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>> {
        if params.len() != self.n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.n_params,
                params.len()
            )));
        }
        Ok(x.mapv(|xi| (self.func)(xi, params)))
    }
}

/// Weighted residuals `w_i (f(x_i, p) - y_i)` of a curve model.
///
/// The solver works on unbounded internal parameters; `eval` maps them to
/// external values through the bounds transforms before calling the model.
pub struct CurveFitProblem<'a, M: CurveModel + ?Sized> {
    model: &'a M,
    x: &'a Array1<f64>,
    y: &'a Array1<f64>,
    weights: Array1<f64>,
    transforms: Vec<BoundsTransform>,
}

impl<'a, M: CurveModel + ?Sized> CurveFitProblem<'a, M> {
    pub fn new(
        model: &'a M,
        x: &'a Array1<f64>,
        y: &'a Array1<f64>,
        weights: Array1<f64>,
        transforms: Vec<BoundsTransform>,
    ) -> Result<Self> {
        if x.len() != y.len() || weights.len() != x.len() {
            return Err(FitError::DimensionMismatch(format!(
                "x has {} points, y has {}, sigma has {}",
                x.len(),
                y.len(),
                weights.len()
            )));
        }
        if transforms.len() != model.parameter_count() {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                model.parameter_count(),
                transforms.len()
            )));
        }
        Ok(Self {
            model,
            x,
            y,
            weights,
            transforms,
        })
    }

    pub fn transforms(&self) -> &[BoundsTransform] {
        &self.transforms
    }

    /// Internal to external parameter values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        internal
            .iter()
            .zip(self.transforms.iter())
            .map(|(&v, t)| t.to_external(v))
            .collect()
    }

    /// External to internal parameter values, checking the bounds.
    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        external
            .iter()
            .zip(self.transforms.iter())
            .map(|(&v, t)| t.to_internal(v).map_err(FitError::from))
            .collect()
    }

    /// Weighted residuals at external parameter values.
    pub fn residuals_external(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        let external = external.to_vec();
        let model = self.model.eval(self.x, &external)?;
        Ok((&model - self.y) * &self.weights)
    }

    /// The same problem seen in external coordinates, used for the covariance.
    pub fn external(&self) -> ExternalView<'_, 'a, M> {
        ExternalView { inner: self }
    }
}

impl<M: CurveModel + ?Sized> Problem for CurveFitProblem<'_, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.residuals_external(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.transforms.len()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

/// [`CurveFitProblem`] with parameters taken as external values.
pub struct ExternalView<'p, 'a, M: CurveModel + ?Sized> {
    inner: &'p CurveFitProblem<'a, M>,
}

impl<M: CurveModel + ?Sized> Problem for ExternalView<'_, '_, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.inner.residuals_external(params)
    }

    fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
