//! # Covariance Matrix Calculations
//!
//! Covariance of the fitted parameters from the weighted Jacobian at the
//! solution, scaled by the reduced chi-square:
//!
//!   covar = redchi * pinv(JᵀJ)
//!
//! The pseudo-inverse is taken through the SVD of J, dropping singular
//! values below `eps * max(m, n) * s_max`, so a rank-deficient Jacobian still
//! yields a finite (if partly meaningless) matrix.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::error::{FitError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Reduced chi-square `cost / (m - n)`, or `None` without degrees of freedom.
pub fn reduced_chi_square(cost: f64, n_data: usize, n_params: usize) -> Option<f64> {
    (n_data > n_params).then(|| cost / (n_data - n_params) as f64)
}

/// Calculate covariance matrix from Jacobian matrix.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let (m, n) = jacobian.dim();
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let j = ndarray_to_nalgebra(jacobian);
    let svd = j.svd(false, true);
    let v_t = svd.v_t.ok_or(FitError::SingularMatrix)?;
    let s = &svd.singular_values;

    let s_max = s.iter().copied().fold(0.0, f64::max);
    let threshold = f64::EPSILON * m.max(n) as f64 * s_max;
    let kept = s.iter().filter(|&&v| v > threshold).count();
    if kept < n {
        log::warn!(
            "Jacobian has rank {} for {} parameters; covariance uses a pseudo-inverse",
            kept,
            n
        );
    }

    // pinv(JᵀJ) = V diag(1/s²) Vᵀ over the kept singular values
    let mut scaled = DMatrix::zeros(v_t.nrows(), n);
    for (k, &sv) in s.iter().enumerate() {
        if sv > threshold {
            let inv = 1.0 / (sv * sv);
            for col in 0..n {
                scaled[(k, col)] = v_t[(k, col)] * inv;
            }
        }
    }
    let pinv = v_t.transpose() * scaled;

    Ok(nalgebra_to_ndarray(&pinv) * redchi)
}

/// Standard errors: square roots of the covariance diagonal.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
