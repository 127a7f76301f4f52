//! Small helpers on 1D data arrays.

use ndarray::Array1;

/// Index of the element of `x` closest to `value`; the first one on ties.
///
/// Returns `None` for an empty array.
///
/// ```
/// use ndarray::array;
/// use sheetfit::utils::index;
///
/// assert_eq!(index(&array![0.0, 1.0, 2.0, 3.0], 1.8), Some(2));
/// ```
pub fn index(x: &Array1<f64>, value: f64) -> Option<usize> {
    x.iter()
        .map(|xi| (xi - value).abs())
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if !(d < best_d) => best,
            _ if d.is_nan() => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// The points whose `x` lies strictly inside any of `ranges`.
///
/// Ranges are visited in the given order, so overlapping ranges yield
/// repeated points.
pub fn extract(x: &Array1<f64>, y: &Array1<f64>, ranges: &[(f64, f64)]) -> (Array1<f64>, Array1<f64>) {
    let mut x_out = Vec::new();
    let mut y_out = Vec::new();
    for &(start, stop) in ranges {
        for (xi, yi) in x.iter().zip(y.iter()) {
            if *xi > start && *xi < stop {
                x_out.push(*xi);
                y_out.push(*yi);
            }
        }
    }
    (Array1::from_vec(x_out), Array1::from_vec(y_out))
}

/// Trapezoidal integral of `y` over `x`.
pub fn trapezoid(y: &Array1<f64>, x: &Array1<f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// An evenly spaced grid over `[min x, max x]` with `len(x) * factor` points.
///
/// A factor of 0 returns `x` unchanged.
pub fn smooth_grid(x: &Array1<f64>, factor: usize) -> Array1<f64> {
    if factor == 0 || x.is_empty() {
        return x.clone();
    }
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Array1::linspace(lo, hi, x.len() * factor)
}
