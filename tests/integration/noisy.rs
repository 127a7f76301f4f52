//! Fits against synthetic spectra with Gaussian noise.

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use sheetfit::models::{fwhm_arctan, fwhm_voigt};
use sheetfit::{FitConfig, FitSession};

use crate::test_helpers::table;

#[test]
fn voigt_on_step_background() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.02).unwrap();

    let x = Array1::linspace(-10.0, 10.0, 401);
    let clean = x.mapv(|v| fwhm_voigt(v, 1.0, 0.5, 1.2, 0.3) + fwhm_arctan(v, 0.5, -2.0, 2.0));
    let y = clean.mapv(|v| v + noise.sample(&mut rng));

    let rows: Vec<&[&str]> = vec![
        &["fwhmVoigt#edge", "A", "y", "y", "0", "", "0.8"],
        &["fwhmVoigt#edge", "c", "y", "y", "-1", "2", "0.3"],
        &["fwhmVoigt#edge", "w", "y", "y", "0.1", "5", "1"],
        &["fwhmVoigt#edge", "m", "y", "y", "0", "1", "0.5"],
        &["fwhmArctan#bg", "A", "y", "y", "0", "", "0.4"],
        &["fwhmArctan#bg", "c", "y", "y", "", "", "-1.5"],
        &["fwhmArctan#bg", "w", "y", "y", "0.1", "", "1.5"],
    ];
    let config = FitConfig {
        save_after_fit: false,
        ..FitConfig::default()
    };
    let mut session = FitSession::with_config(table(&rows), config);
    let report = session.fit(&x, &y, &[]).unwrap();

    let truth = [1.0, 0.5, 1.2, 0.3, 0.5, -2.0, 2.0];
    for (i, t) in truth.iter().enumerate() {
        let (p, e) = (report.params[i], report.errors[i]);
        assert!(e.is_finite() && e > 0.0, "{}: error {}", report.labels[i], e);
        assert!(
            (p - t).abs() < 5.0 * e + 1e-3,
            "{} = {} +/- {}, expected {}",
            report.labels[i],
            p,
            e,
            t
        );
    }

    // Residue is of the order of the noise integrated over the range
    assert!(report.residue < 20.0 * 0.05);
}
