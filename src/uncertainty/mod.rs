//! # Uncertainty Calculation
//!
//! Parameter uncertainties of a weighted least-squares fit, computed the way
//! scipy's `curve_fit` does with relative σ: the covariance is scaled by the
//! reduced chi-square of the fit.

mod covariance;

pub use covariance::{calculate_covariance, reduced_chi_square, standard_errors_from_covariance};
