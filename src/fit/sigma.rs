//! Per-point σ arrays built from a global value and tie ranges.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::utils::index;

/// σ used for every point not covered by a tie range.
pub const DEFAULT_GLOBAL_SIGMA: f64 = 1e-13;

/// An x-interval fitted `factor` times more tightly than the rest.
///
/// Inside the interval σ becomes `global_sigma / factor`, so a factor of 10
/// weighs those points 100 times more in the chi-square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieRange {
    pub start: f64,
    pub stop: f64,
    pub factor: f64,
}

impl TieRange {
    pub fn new(start: f64, stop: f64, factor: f64) -> Self {
        Self {
            start,
            stop,
            factor,
        }
    }
}

impl From<(f64, f64, f64)> for TieRange {
    fn from((start, stop, factor): (f64, f64, f64)) -> Self {
        Self::new(start, stop, factor)
    }
}

/// σ for every point of `x`.
///
/// Each tie covers the index slice `[i0, i1)` where `i0` and `i1` are the
/// points closest to `start` and `stop`, taken in increasing order. Later
/// ties overwrite earlier ones where they overlap.
///
/// ```
/// use ndarray::array;
/// use sheetfit::fit::{fake_sigma, TieRange};
///
/// let x = array![0.0, 1.0, 2.0, 3.0, 4.0];
/// let sigma = fake_sigma(&x, 1.0, &[TieRange::new(1.0, 3.0, 4.0)]);
/// assert_eq!(sigma, array![1.0, 0.25, 0.25, 1.0, 1.0]);
/// ```
pub fn fake_sigma(x: &Array1<f64>, global_sigma: f64, ties: &[TieRange]) -> Array1<f64> {
    let mut sigma = Array1::from_elem(x.len(), global_sigma);
    for tie in ties {
        let (Some(i0), Some(i1)) = (index(x, tie.start), index(x, tie.stop)) else {
            continue;
        };
        let (lo, hi) = if i0 <= i1 { (i0, i1) } else { (i1, i0) };
        sigma
            .slice_mut(ndarray::s![lo..hi])
            .fill(global_sigma / tie.factor);
    }
    sigma
}
