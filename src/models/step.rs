//! Step-like models, mostly used as backgrounds under peaks.

use std::f64::consts::PI;

/// Heaviside step with numpy semantics: `at_zero` is returned for `x == 0`.
fn heaviside(x: f64, at_zero: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else if x > 0.0 {
        1.0
    } else {
        at_zero
    }
}

/// Arctangent step rising from 0 to `A`, centred at `c`.
///
/// It takes `w` units of x to go from A/4 to 3A/4.
pub fn fwhm_arctan(x: f64, a: f64, c: f64, w: f64) -> f64 {
    a * (((x - c) / w).atan() + PI / 2.0) / PI
}

/// Rectangular window of height `A` and width `w` centred at `c`.
pub fn square(x: f64, a: f64, c: f64, w: f64) -> f64 {
    -heaviside(x - c - w / 2.0, a) * a + heaviside(x - c + w / 2.0, a) * a
}

/// Error-function step rising from 0 to `A`, centred at `c`.
pub fn fwhm_err(x: f64, a: f64, c: f64, w: f64) -> f64 {
    a / 2.0 * (libm::erf((x - c) / w / 2.0) + 1.0)
}
