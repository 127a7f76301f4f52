//! Configuration options for the Levenberg-Marquardt algorithm.

use serde::{Deserialize, Serialize};

/// Method for solving the damped normal equations of each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionMethod {
    /// Cholesky decomposition (fastest, requires a positive definite system)
    Cholesky,

    /// LU decomposition with partial pivoting
    Lu,

    /// SVD decomposition (slowest, handles rank-deficient systems)
    Svd,

    /// Cholesky first, falling back to LU and then SVD
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of accepted steps. Default: 1000
    pub max_iterations: usize,

    /// Relative tolerance on the cost reduction. Default: 1e-8
    pub ftol: f64,

    /// Relative tolerance on the parameter step. Default: 1e-8
    pub xtol: f64,

    /// Tolerance on the scaled gradient. Default: 1e-8
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Relative step of the finite-difference Jacobian. Default: 1e-8
    pub epsilon: f64,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            epsilon: 1e-8,
            decomposition_method: DecompositionMethod::default(),
        }
    }
}
