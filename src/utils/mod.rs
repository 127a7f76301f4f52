//! Utility functions and helpers for the sheetfit library.

pub mod array;
pub mod finite_difference;
pub mod matrix_convert;

pub use array::{extract, index, smooth_grid, trapezoid};
pub use matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};
