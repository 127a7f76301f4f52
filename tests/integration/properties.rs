//! Behaviour of a full fit cycle that holds for any table.

use approx::assert_relative_eq;
use ndarray::Array1;
use sheetfit::models::{fwhm_gauss, fwhm_lorentz};
use sheetfit::{CellValue, FitSession, TableSource, TieRange};

use crate::test_helpers::{local_ssr, table};

fn two_peak_rows() -> Vec<[&'static str; 7]> {
    vec![
        ["fwhmGauss#1", "A", "y", "y", "0", "", "2"],
        ["fwhmGauss#1", "c", "y", "y", "", "", "-1"],
        ["fwhmGauss#1", "w", "y", "y", "0.05", "", "0.8"],
        ["fwhmLorentz#2", "A", "y", "y", "0", "", "1"],
        ["fwhmLorentz#2", "c", "y", "y", "", "", "1.5"],
        ["fwhmLorentz#2", "w", "y", "fwhmGauss#1,w", "", "", ""],
    ]
}

fn two_peaks(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| fwhm_gauss(v, 2.0, -1.0, 0.8) + fwhm_lorentz(v, 1.0, 1.5, 0.8))
}

#[test]
fn fit_at_the_true_guess_is_a_no_op() {
    let rows = two_peak_rows();
    let rows: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
    let x = Array1::linspace(-5.0, 5.0, 201);
    let y = two_peaks(&x);

    let mut session = FitSession::new(table(&rows));
    let report = session.fit(&x, &y, &[]).unwrap();

    for (p, t) in report.params.iter().zip([2.0, -1.0, 0.8, 1.0, 1.5]) {
        assert_relative_eq!(*p, t, epsilon = 1e-9);
    }
    assert_relative_eq!(report.residue, 0.0, epsilon = 1e-9);

    let t = session.table();
    for row in 1..t.row_count() {
        let Some(guess) = t.get(row, "guess").unwrap().as_number() else {
            continue;
        };
        let fitted = t.get(row, "fitted").unwrap().as_number().unwrap();
        assert_relative_eq!(fitted, guess, epsilon = 1e-9);
    }
    // The linked width row receives the shared value
    let linked = t.get(6, "fitted").unwrap().as_number().unwrap();
    assert_relative_eq!(linked, 0.8, epsilon = 1e-9);
}

#[test]
fn fit_leaves_guesses_alone_and_is_repeatable() {
    let rows: Vec<&[&str]> = vec![
        &["fwhmGauss#1", "A", "y", "y", "0", "", "1.5"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "-0.7"],
        &["fwhmGauss#1", "w", "y", "y", "0.05", "", "1"],
        &["fwhmLorentz#2", "A", "y", "y", "0", "", "0.5"],
        &["fwhmLorentz#2", "c", "y", "y", "", "", "1.2"],
        &["fwhmLorentz#2", "w", "y", "fwhmGauss#1,w", "", "", ""],
    ];
    let x = Array1::linspace(-5.0, 5.0, 201);
    let y = two_peaks(&x);

    let mut session = FitSession::new(table(&rows));
    let first = session.fit(&x, &y, &[]).unwrap();
    let guesses = session.table().read_column("guess").unwrap();
    let second = session.fit(&x, &y, &[]).unwrap();

    assert_eq!(session.table().read_column("guess").unwrap(), guesses);
    assert_eq!(guesses[0], CellValue::Number(1.5));
    assert_eq!(first.params, second.params);

    let truth = [2.0, -1.0, 0.8, 1.0, 1.5];
    for (p, t) in first.params.iter().zip(truth) {
        assert_relative_eq!(*p, t, epsilon = 1e-6);
    }
}

#[test]
fn every_row_of_a_slot_gets_the_same_result() {
    let rows = two_peak_rows();
    let rows: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
    let x = Array1::linspace(-5.0, 5.0, 201);
    let y = two_peaks(&x).mapv(|v| v + 0.01 * (3.0 * v).sin());

    let mut session = FitSession::new(table(&rows));
    let report = session.fit(&x, &y, &[]).unwrap();

    let t = session.table();
    let ids: Vec<String> = t.read_column("id").unwrap().iter().map(|c| c.as_text()).collect();
    assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4", "p2"]);

    let fitted = t.read_column("fitted").unwrap();
    let errors = t.read_column("error").unwrap();
    assert_eq!(fitted[2], fitted[5]);
    assert_eq!(errors[2], errors[5]);
    assert_eq!(fitted[2].as_number(), Some(report.params[2]));
    assert!(report.errors.iter().all(|e| e.is_finite() && *e > 0.0));
}

#[test]
fn tie_range_pulls_the_fit_towards_its_window() {
    // One Gaussian cannot describe the shoulder at x = 1.5
    let rows: Vec<&[&str]> = vec![
        &["fwhmGauss#1", "A", "y", "y", "0", "", "1"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0"],
        &["fwhmGauss#1", "w", "y", "y", "0.05", "10", "1"],
    ];
    let x = Array1::linspace(-4.0, 4.0, 161);
    let y = x.mapv(|v| fwhm_gauss(v, 1.0, 0.0, 1.0) + fwhm_gauss(v, 0.3, 1.5, 0.4));

    let mut plain = FitSession::new(table(&rows));
    let untied = plain.fit(&x, &y, &[]).unwrap();
    let untied_curve = plain.state().unwrap().fit_curve(&x).unwrap();

    let mut weighted = FitSession::new(table(&rows));
    let tied = weighted
        .fit(&x, &y, &[TieRange::new(1.0, 2.0, 1000.0)])
        .unwrap();
    let tied_curve = weighted.state().unwrap().fit_curve(&x).unwrap();

    assert_ne!(untied.params, tied.params);
    let before = local_ssr(&x, &untied_curve, &y, 1.0, 2.0);
    let after = local_ssr(&x, &tied_curve, &y, 1.0, 2.0);
    assert!(after < before, "local SSR {} is not below {}", after, before);
}

#[test]
fn amplitude_guess_on_its_lower_bound_still_fits() {
    let rows: Vec<&[&str]> = vec![
        &["fwhmGauss#1", "A", "y", "y", "0", "10", "0"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0"],
        &["fwhmGauss#1", "w", "y", "y", "0.05", "", "1"],
    ];
    let x = Array1::linspace(-3.0, 3.0, 121);
    let y = x.mapv(|v| fwhm_gauss(v, 2.0, 0.0, 0.8));

    let mut session = FitSession::new(table(&rows));
    let report = session.fit(&x, &y, &[]).unwrap();
    assert_relative_eq!(report.params[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(report.params[2], 0.8, epsilon = 1e-6);
    assert!(report.residue < 1e-6);

    // The guess cell keeps the value the user typed
    assert_eq!(session.table().get(1, "guess").unwrap(), CellValue::Number(0.0));
}

#[test]
fn inactive_submodels_do_not_contribute() {
    let rows: Vec<&[&str]> = vec![
        &["fwhmGauss#1", "A", "y", "y", "0", "", "1.5"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0.2"],
        &["fwhmGauss#1", "w", "y", "y", "0.05", "", "1"],
        &["fwhmArctan#bg", "A", "n", "y", "", "", "5"],
        &["fwhmArctan#bg", "c", "n", "y", "", "", "0"],
        &["fwhmArctan#bg", "w", "n", "y", "", "", "1"],
    ];
    let x = Array1::linspace(-3.0, 3.0, 121);
    let y = x.mapv(|v| fwhm_gauss(v, 2.0, 0.0, 0.8));

    let mut session = FitSession::new(table(&rows));
    let report = session.fit(&x, &y, &[]).unwrap();
    assert_eq!(report.signature, "f(x, p0, p1, p2)");
    assert_relative_eq!(report.params[0], 2.0, epsilon = 1e-6);

    let t = session.table();
    assert_eq!(t.get(4, "fitted").unwrap(), CellValue::Empty);
    assert_eq!(t.get(4, "id").unwrap(), CellValue::Empty);
}
