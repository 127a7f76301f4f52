//! Weighted, bounded curve fitting.
//!
//! [`curve_fit`] minimises `Σ((y - f(x, p)) / σ)²` with box bounds on `p`
//! and reports the parameter covariance scaled by the reduced chi-square,
//! i.e. σ is taken as relative, not absolute.

mod sigma;

pub use sigma::{fake_sigma, TieRange, DEFAULT_GLOBAL_SIGMA};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::parameters::{Bounds, BoundsTransform};
use crate::problem::{CurveFitProblem, CurveModel};
use crate::uncertainty::{calculate_covariance, reduced_chi_square, standard_errors_from_covariance};
use crate::utils::{finite_difference, trapezoid};

/// Outcome of [`curve_fit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFitResult {
    /// Best-fit parameter values.
    pub params: Array1<f64>,
    /// Parameter covariance; all `inf` when there are no degrees of freedom.
    pub covariance: Array2<f64>,
    /// One-standard-deviation errors, `sqrt(diag(covariance))`.
    pub errors: Array1<f64>,
    /// Sum of squared residuals after scaling by `σ_min / σ_i`.
    pub cost: f64,
    pub iterations: usize,
    pub func_evals: usize,
    pub message: String,
}

/// Fit `model` to `(x, y)`.
///
/// `sigma` defaults to uniform weights. `bounds` must hold one entry per
/// parameter and every `p0` value must lie inside its bounds. A guess on a
/// bound starts the solver just inside it.
pub fn curve_fit<M: CurveModel + ?Sized>(
    model: &M,
    x: &Array1<f64>,
    y: &Array1<f64>,
    p0: &Array1<f64>,
    sigma: Option<&Array1<f64>>,
    bounds: &[Bounds],
    config: &LmConfig,
) -> Result<CurveFitResult> {
    let n = model.parameter_count();
    let m = x.len();
    if y.len() != m {
        return Err(FitError::DimensionMismatch(format!(
            "x has {} points, y has {}",
            m,
            y.len()
        )));
    }
    if p0.len() != n || bounds.len() != n {
        return Err(FitError::DimensionMismatch(format!(
            "model has {} parameters, got {} guesses and {} bounds",
            n,
            p0.len(),
            bounds.len()
        )));
    }
    for (b, &v) in bounds.iter().zip(p0.iter()) {
        b.check(v)?;
    }

    let weights = relative_weights(sigma, m)?;
    let transforms: Vec<BoundsTransform> = bounds.iter().copied().map(BoundsTransform::new).collect();
    let problem = CurveFitProblem::new(model, x, y, weights, transforms)?;

    if n == 0 {
        let residuals = problem.residuals_external(p0)?;
        return Ok(CurveFitResult {
            params: p0.clone(),
            covariance: Array2::zeros((0, 0)),
            errors: Array1::zeros(0),
            cost: residuals.iter().map(|r| r * r).sum(),
            iterations: 0,
            func_evals: 1,
            message: "No free parameters".to_string(),
        });
    }

    let start: Array1<f64> = p0
        .iter()
        .zip(bounds.iter())
        .map(|(&v, b)| b.interior_start(v))
        .collect();
    let internal = problem.to_internal(&start)?;
    let result = LevenbergMarquardt::with_config(config.clone()).minimize(&problem, internal)?;
    log::debug!("{}", result);
    if !result.success {
        return Err(FitError::ConvergenceFailure(result.message));
    }

    let params = problem.to_external(&result.params);
    let jac = finite_difference::jacobian(&problem.external(), &params, Some(config.epsilon))?;
    let covariance = match reduced_chi_square(result.cost, m, n) {
        Some(redchi) => calculate_covariance(&jac, redchi)?,
        None => {
            log::warn!(
                "{} points for {} parameters: covariance cannot be estimated",
                m,
                n
            );
            Array2::from_elem((n, n), f64::INFINITY)
        }
    };
    let errors = standard_errors_from_covariance(&covariance);

    Ok(CurveFitResult {
        params,
        covariance,
        errors,
        cost: result.cost,
        iterations: result.iterations,
        func_evals: result.func_evals,
        message: result.message,
    })
}

/// `σ_min / σ_i`: same minimiser and relative covariance as `1 / σ_i`, but
/// residuals stay on the scale of the data even for tiny σ.
fn relative_weights(sigma: Option<&Array1<f64>>, m: usize) -> Result<Array1<f64>> {
    let Some(sigma) = sigma else {
        return Ok(Array1::ones(m));
    };
    if sigma.len() != m {
        return Err(FitError::DimensionMismatch(format!(
            "x has {} points, sigma has {}",
            m,
            sigma.len()
        )));
    }
    if let Some(bad) = sigma.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(FitError::InvalidSigma(format!(
            "sigma must be positive and finite, found {}",
            bad
        )));
    }
    let s_min = sigma.iter().copied().fold(f64::INFINITY, f64::min);
    Ok(sigma.mapv(|s| s_min / s))
}

/// Trapezoidal integral of `|y - f(x, params)|` over `x`.
pub fn residue<M: CurveModel + ?Sized>(
    model: &M,
    x: &Array1<f64>,
    y: &Array1<f64>,
    params: &[f64],
) -> Result<f64> {
    let fit = model.eval(x, params)?;
    Ok(trapezoid(&(y - &fit).mapv(f64::abs), x))
}
