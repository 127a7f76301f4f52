//! Peak models for fitting spectra.
//!
//! Amplitude-normalised (`A` is the peak height) and area-normalised (`A` is
//! the integral) variants of the Gaussian, Lorentzian and pseudo-Voigt line
//! shapes. `c` is always the center and `w` the width.

use std::f64::consts::{LN_2, PI};

/// Gaussian with standard deviation `w`.
///
/// f(x) = A * exp(-(x - c)² / (2 w²))
pub fn gauss(x: f64, a: f64, c: f64, w: f64) -> f64 {
    a * (-(x - c).powi(2) / (2.0 * w * w)).exp()
}

/// Gaussian with full width at half maximum `w`.
///
/// f(x) = A * exp(-4 ln2 (x - c)² / w²)
pub fn fwhm_gauss(x: f64, a: f64, c: f64, w: f64) -> f64 {
    a * (-4.0 * LN_2 * (x - c).powi(2) / (w * w)).exp()
}

/// Gaussian with FWHM `w` where `A` scales the area.
pub fn fwhm_area_gauss(x: f64, a: f64, c: f64, w: f64) -> f64 {
    // Normalisation kept exactly as the toolkit always wrote it: pi/4*ln2,
    // not pi/(4 ln2).
    a / (w * (PI / 4.0 * LN_2).sqrt()) * (-4.0 * LN_2 * (x - c).powi(2) / (w * w)).exp()
}

/// Cauchy-Lorentz distribution with scale factor `A` (gamma).
///
/// f(x) = 1/(pi A) * A² / (A² + (x - c)²)
pub fn lorentz(x: f64, a: f64, c: f64) -> f64 {
    (1.0 / (PI * a)) * (a * a / (a * a + (x - c).powi(2)))
}

/// Lorentzian with amplitude `A` and FWHM `w`.
///
/// f(x) = A * w² / (w² + 4 (x - c)²)
pub fn fwhm_lorentz(x: f64, a: f64, c: f64, w: f64) -> f64 {
    a * (w * w / (w * w + 4.0 * (x - c).powi(2)))
}

/// Lorentzian with area `A` and FWHM `w`.
///
/// f(x) = 2A/pi * w / (w² + 4 (x - c)²)
pub fn fwhm_area_lorentz(x: f64, a: f64, c: f64, w: f64) -> f64 {
    (2.0 * a / PI) * (w / (w * w + 4.0 * (x - c).powi(2)))
}

/// Pseudo-Voigt: `m` is the Lorentzian fraction (1 = pure Lorentzian).
pub fn fwhm_voigt(x: f64, a: f64, c: f64, w: f64, m: f64) -> f64 {
    let lorentz = fwhm_lorentz(x, 1.0, c, w);
    let gauss = fwhm_gauss(x, 1.0, c, w);
    a * (m * lorentz + (1.0 - m) * gauss)
}

/// Area-normalised pseudo-Voigt.
pub fn fwhm_area_voigt(x: f64, a: f64, c: f64, w: f64, m: f64) -> f64 {
    let lorentz = fwhm_area_lorentz(x, 1.0, c, w);
    let gauss = fwhm_area_gauss(x, 1.0, c, w);
    a * (m * lorentz + (1.0 - m) * gauss)
}
