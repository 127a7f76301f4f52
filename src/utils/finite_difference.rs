//! Finite difference approximation of the residual Jacobian.

use crate::error::{FitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step for forward differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// `J[i, j] = ∂residual[i] / ∂param[j]`. The step for parameter `j` is
/// `eps * |param_j|`, or `eps` itself for parameters close to zero.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(FitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    let mut perturbed = params.clone();
    for j in 0..n_params {
        let param_j = params[j];
        let eps_j = if param_j.abs() > eps {
            param_j.abs() * eps
        } else {
            eps
        };

        perturbed[j] = param_j + eps_j;
        let residuals_perturbed = problem.eval(&perturbed)?;
        perturbed[j] = param_j;

        // Use the step actually representable in floating point
        let h = (param_j + eps_j) - param_j;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / h;
        }
    }

    Ok(jac)
}
