//! Levenberg-Marquardt algorithm for bounded, weighted curve fitting.

pub mod algorithm;
pub mod config;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
