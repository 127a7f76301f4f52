//! Errors raised while building the model, before any fit.

use ndarray::Array1;
use sheetfit::{CellValue, FitError, FitSession};

use crate::test_helpers::table;

#[test]
fn missing_guesses_are_reported_in_one_error() {
    let t = table(&[
        &["fwhmGauss#1", "A", "y", "y", "", "", ""],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0"],
        &["fwhmGauss#1", "w", "y", "fwhmGauss#2,w", "", "", ""],
        &["fwhmGauss#2", "A", "y", "y", "", "", "1"],
        &["fwhmGauss#2", "c", "y", "y", "", "", ""],
        &["fwhmGauss#2", "w", "y", "y", "", "", ""],
    ]);
    let mut session = FitSession::new(t);
    match session.update_model() {
        Err(FitError::MissingGuess { ids }) => assert_eq!(ids, vec!["p0", "x0", "p3"]),
        other => panic!("expected MissingGuess, got {:?}", other.map(|s| s.model.signature())),
    }
}

#[test]
fn missing_argument_fails_before_fitting() {
    let t = table(&[
        &["fwhmGauss#1", "A", "y", "y", "", "", "1"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0"],
        &["fwhmLorentz#2", "A", "y", "y", "", "", "1"],
        &["fwhmLorentz#2", "c", "y", "y", "", "", "2"],
        &["fwhmLorentz#2", "w", "y", "y", "", "", "1"],
    ]);
    let x = Array1::linspace(0.0, 1.0, 10);
    let y = Array1::zeros(10);

    let mut session = FitSession::new(t);
    match session.fit(&x, &y, &[]) {
        Err(FitError::MissingArgument { submodel, arg }) => {
            assert_eq!(submodel, "fwhmGauss#1");
            assert_eq!(arg, "w");
        }
        other => panic!("expected MissingArgument, got {:?}", other.map(|r| r.message)),
    }

    // Nothing was written: no ids, no fitted values
    let t = session.table();
    for row in 1..=5 {
        assert_eq!(t.get(row, "id").unwrap(), CellValue::Empty);
        assert_eq!(t.get(row, "fitted").unwrap(), CellValue::Empty);
    }
}

#[test]
fn cyclic_links_are_rejected() {
    let t = table(&[
        &["Lorentz#1", "A", "y", "Lorentz#1,A", "", "", "1"],
        &["Lorentz#1", "c", "y", "y", "", "", "0"],
    ]);
    let mut session = FitSession::new(t);
    match session.update_model() {
        Err(FitError::CyclicDependency { chain }) => {
            assert_eq!(chain, vec!["Lorentz#1,A", "Lorentz#1,A"])
        }
        other => panic!("expected CyclicDependency, got {:?}", other.map(|s| s.model.signature())),
    }
}

#[test]
fn fixed_rows_get_fitted_equal_guess_without_a_fit() {
    let t = table(&[
        &["fwhmVoigt#1", "A", "y", "n", "", "", "3.5", "99", "7"],
        &["fwhmVoigt#1", "c", "y", "y", "", "", "0"],
        &["fwhmVoigt#1", "w", "y", "n", "", "", "0.25"],
        &["fwhmVoigt#1", "m", "y", "n", "0", "1", "0.5"],
        &["fwhmVoigt#1", "m", "n", "n", "", "", "0.9", "1", "1"],
    ]);
    let mut session = FitSession::new(t);
    session.update_model().unwrap();

    let t = session.table();
    for row in [1, 3, 4] {
        assert_eq!(t.get(row, "fitted").unwrap(), t.get(row, "guess").unwrap());
        assert_eq!(t.get(row, "error").unwrap(), CellValue::Number(0.0));
    }
    // Unused rows keep whatever they had
    assert_eq!(t.get(5, "fitted").unwrap(), CellValue::Number(1.0));
    assert_eq!(t.get(5, "id").unwrap(), CellValue::Empty);
}

#[test]
fn unknown_function_name() {
    let t = table(&[&["Sinc#1", "A", "y", "y", "", "", "1"]]);
    let mut session = FitSession::new(t);
    assert!(matches!(
        session.update_model(),
        Err(FitError::UnknownModel(name)) if name == "Sinc"
    ));

    // Registering it makes the same table usable
    session
        .registry_mut()
        .register("Sinc", &["A"], |x, p| p[0] * if x == 0.0 { 1.0 } else { x.sin() / x });
    assert_eq!(session.update_model().unwrap().model.signature(), "f(x, p0)");
}
