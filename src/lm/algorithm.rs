//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//! `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr` and accepts the step only if it lowers the
//! sum of squares. λ shrinks after an accepted step and grows after a
//! rejected one.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{FitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;
use crate::utils::matrix_convert::{ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

use super::config::{DecompositionMethod, LmConfig};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of residual evaluations, Jacobian columns included
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Status of the iteration.
enum IterationStatus {
    /// Continue iteration
    Continue,

    /// Converged successfully
    Converged(String),

    /// Failed to converge
    Failed(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

fn sum_squares(r: &Array1<f64>) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn l2_norm<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in residual norm.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the factor by which to increase lambda.
    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    /// Set the factor by which to decrease lambda.
    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    /// Set the minimum value for lambda.
    pub fn with_min_lambda(mut self, min_lambda: f64) -> Self {
        self.config.min_lambda = min_lambda;
        self
    }

    /// Set the maximum value for lambda.
    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Set the relative finite-difference step.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set the method used for solving the linear system.
    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.config.decomposition_method = method;
        self
    }

    fn jacobian<P: Problem>(&self, problem: &P, params: &Array1<f64>) -> Result<Array2<f64>> {
        if problem.has_custom_jacobian() {
            problem.jacobian(params)
        } else {
            finite_difference::jacobian(problem, params, Some(self.config.epsilon))
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Running out of iterations, or λ growing past `max_lambda` without a
    /// step that lowers the cost, ends with `success == false` rather than an
    /// error; the caller decides what that means.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        let mut cost = sum_squares(&residuals);
        if !cost.is_finite() {
            return Err(FitError::FunctionEvaluation(
                "residuals are not finite at the initial parameters".to_string(),
            ));
        }

        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let finish = |params: Array1<f64>,
                      residuals: Array1<f64>,
                      cost: f64,
                      iterations: usize,
                      func_evals: usize,
                      success: bool,
                      message: String| LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            message,
        };

        if cost == 0.0 || n_params == 0 {
            return Ok(finish(
                params,
                residuals,
                cost,
                0,
                func_evals,
                true,
                "Nothing to minimize at the initial parameters".to_string(),
            ));
        }

        loop {
            let jac = self.jacobian(problem, &params)?;
            func_evals += n_params;

            let j = ndarray_to_nalgebra(&jac);
            let r = ndarray_vec_to_nalgebra(&residuals);
            let jtj = j.tr_mul(&j);
            let g = j.tr_mul(&r);

            // Largest cosine between a Jacobian column and the residual vector
            let r_norm = cost.sqrt();
            let g_scaled = (0..n_params)
                .map(|k| {
                    let col_norm = jtj[(k, k)].sqrt();
                    if col_norm > 0.0 {
                        g[k].abs() / (col_norm * r_norm)
                    } else {
                        0.0
                    }
                })
                .fold(0.0, f64::max);
            if g_scaled <= self.config.gtol {
                let message = format!(
                    "Gradient convergence: {:.2e} <= {:.2e}",
                    g_scaled, self.config.gtol
                );
                return Ok(finish(params, residuals, cost, iterations, func_evals, true, message));
            }

            let status = loop {
                let step = match self.solve_step(&jtj, &g, lambda) {
                    Some(step) => step,
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            break IterationStatus::Failed(
                                "Failed to solve the damped normal equations".to_string(),
                            );
                        }
                        continue;
                    }
                };

                let step_norm = step.norm();
                let param_norm = l2_norm(params.iter());
                let small_step = step_norm <= self.config.xtol * (param_norm + self.config.xtol);

                let new_params = &params + &step.iter().copied().collect::<Array1<f64>>();
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_squares(&new_residuals);

                if new_cost.is_finite() && new_cost < cost {
                    let cost_change = (cost - new_cost) / cost;
                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    iterations += 1;

                    break if small_step {
                        IterationStatus::Converged(format!(
                            "Parameter convergence: |dx| = {:.2e}",
                            step_norm
                        ))
                    } else if cost_change <= self.config.ftol || cost == 0.0 {
                        IterationStatus::Converged(format!(
                            "Cost convergence: |df|/|f| = {:.2e} <= {:.2e}",
                            cost_change, self.config.ftol
                        ))
                    } else if iterations >= self.config.max_iterations {
                        IterationStatus::Failed(format!(
                            "Maximum iterations ({}) reached",
                            self.config.max_iterations
                        ))
                    } else {
                        IterationStatus::Continue
                    };
                }

                // No lower cost and the step has become negligible: we are at
                // the minimum to working precision.
                if small_step {
                    break IterationStatus::Converged(format!(
                        "Parameter convergence: |dx| = {:.2e}",
                        step_norm
                    ));
                }

                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    break IterationStatus::Failed(
                        "Failed to decrease cost, and lambda reached maximum".to_string(),
                    );
                }
            };

            match status {
                IterationStatus::Continue => {}
                IterationStatus::Converged(message) => {
                    return Ok(finish(params, residuals, cost, iterations, func_evals, true, message));
                }
                IterationStatus::Failed(message) => {
                    return Ok(finish(params, residuals, cost, iterations, func_evals, false, message));
                }
            }
        }
    }

    /// Solve `(JᵀJ + λ·D) δ = -Jᵀr` with `D = diag(JᵀJ)`, floored so that
    /// parameters without influence still get damped.
    fn solve_step(&self, jtj: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
        let n = jtj.nrows();
        let max_diag = (0..n).map(|i| jtj[(i, i)]).fold(0.0, f64::max);
        let floor = if max_diag > 0.0 {
            max_diag * f64::EPSILON
        } else {
            1.0
        };

        let mut a = jtj.clone();
        for i in 0..n {
            a[(i, i)] += lambda * jtj[(i, i)].max(floor);
        }
        let rhs = -g;

        let cholesky = |a: &DMatrix<f64>| a.clone().cholesky().map(|c| c.solve(&rhs));
        let lu = |a: &DMatrix<f64>| a.clone().lu().solve(&rhs);
        let svd = |a: &DMatrix<f64>| a.clone().svd(true, true).solve(&rhs, f64::EPSILON).ok();

        let step = match self.config.decomposition_method {
            DecompositionMethod::Cholesky => cholesky(&a),
            DecompositionMethod::Lu => lu(&a),
            DecompositionMethod::Svd => svd(&a),
            DecompositionMethod::Auto => cholesky(&a).or_else(|| lu(&a)).or_else(|| svd(&a)),
        };
        step.filter(|s| s.iter().all(|v| v.is_finite()))
    }
}
