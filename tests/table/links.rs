//! Link chains collapse onto shared slots or literals.

use sheetfit::composite::ArgBinding;
use sheetfit::resolve::{resolve, RowRole};
use sheetfit::{FitSession, ModelRegistry, ParameterTable, TableSource};

use crate::test_helpers::{ids, table};

#[test]
fn chain_to_free_terminal_shares_one_slot() {
    // Lorentz#1,A -> Lorentz#2,A -> Lorentz#3,A (free)
    let mut t = table(&[
        &["Lorentz#1", "A", "y", "Lorentz#2,A", "", "", ""],
        &["Lorentz#1", "c", "y", "n", "", "", "0"],
        &["Lorentz#2", "A", "y", "Lorentz#3,A", "", "", ""],
        &["Lorentz#2", "c", "y", "n", "", "", "1"],
        &["Lorentz#3", "A", "y", "y", "0", "", "0.4"],
        &["Lorentz#3", "c", "y", "n", "", "", "2"],
    ]);
    let parameters = ParameterTable::read(&mut t).unwrap();
    let res = resolve(&parameters, &ModelRegistry::with_builtins()).unwrap();

    assert_eq!(res.model.parameter_count(), 1);
    for term in res.model.terms() {
        assert_eq!(term.bindings[0], ArgBinding::Slot(0));
    }
    assert_eq!(res.slots[0].guess, Some(0.4));
    assert_eq!(res.slots[0].bounds.min, 0.0);

    let mut session = FitSession::new(t);
    session.update_model().unwrap();
    assert_eq!(ids(session.table()), vec!["x0", "-", "x0", "-", "x0", "-"]);
}

#[test]
fn chain_to_fixed_terminal_is_literal_at_any_length() {
    let registry = ModelRegistry::with_builtins();

    // One hop
    let mut short = table(&[
        &["Lorentz#1", "A", "y", "n", "", "", "0.7"],
        &["Lorentz#1", "c", "y", "y", "", "", "0"],
        &["Lorentz#2", "A", "y", "Lorentz#1,A", "", "", ""],
        &["Lorentz#2", "c", "y", "y", "", "", "1"],
    ]);
    // Three hops
    let mut long = table(&[
        &["Lorentz#1", "A", "y", "n", "", "", "0.7"],
        &["Lorentz#1", "c", "y", "y", "", "", "0"],
        &["Lorentz#2", "A", "y", "Lorentz#3,A", "", "", ""],
        &["Lorentz#2", "c", "y", "y", "", "", "1"],
        &["Lorentz#3", "A", "y", "Lorentz#4,A", "", "", ""],
        &["Lorentz#3", "c", "y", "y", "", "", "2"],
        &["Lorentz#4", "A", "y", "Lorentz#1,A", "", "", ""],
        &["Lorentz#4", "c", "y", "y", "", "", "3"],
    ]);

    for t in [&mut short, &mut long] {
        let parameters = ParameterTable::read(t).unwrap();
        let res = resolve(&parameters, &registry).unwrap();
        let term = &res.model.terms()[1];
        assert_eq!(term.bindings[0], ArgBinding::Literal(0.7));
        let linked = res
            .annotations
            .iter()
            .find(|a| a.key.submodel == "Lorentz#2" && a.key.arg == "A")
            .unwrap();
        assert_eq!(
            linked.role,
            RowRole::Fixed {
                value: 0.7,
                linked: true
            }
        );
    }
}

#[test]
fn slot_count_counts_link_classes_not_rows() {
    // Every active row ends on one of the three free rows of peak 1
    let mut t = table(&[
        &["fwhmGauss#1", "A", "y", "y", "", "", "1"],
        &["fwhmGauss#1", "c", "y", "y", "", "", "0"],
        &["fwhmGauss#1", "w", "y", "y", "", "", "1"],
        &["fwhmGauss#2", "A", "y", "fwhmGauss#1,A", "", "", ""],
        &["fwhmGauss#2", "c", "y", "n", "", "", "3"],
        &["fwhmGauss#2", "w", "y", "fwhmGauss#1,w", "", "", ""],
        &["fwhmGauss#3", "A", "y", "fwhmGauss#2,A", "", "", ""],
        &["fwhmGauss#3", "c", "y", "n", "", "", "6"],
        &["fwhmGauss#3", "w", "y", "fwhmGauss#2,w", "", "", ""],
        &["fwhmGauss#4", "A", "n", "y", "", "", "1"],
        &["fwhmGauss#4", "c", "n", "y", "", "", "1"],
        &["fwhmGauss#4", "w", "n", "y", "", "", "1"],
    ]);
    let parameters = ParameterTable::read(&mut t).unwrap();
    let res = resolve(&parameters, &ModelRegistry::with_builtins()).unwrap();
    assert_eq!(res.model.signature(), "f(x, p0, p1, p2)");
    assert_eq!(res.model.terms().len(), 3);
}

#[test]
fn slot_order_follows_table_and_argument_order() {
    let mut t = table(&[
        &["fwhmVoigt#b", "A", "y", "y", "", "", "1"],
        &["fwhmVoigt#b", "m", "y", "y", "0", "1", "0.5"],
        &["fwhmVoigt#b", "c", "y", "y", "", "", "2"],
        &["fwhmVoigt#b", "w", "y", "fwhmLorentz#a,w", "", "", ""],
        &["fwhmLorentz#a", "A", "y", "y", "", "", "1"],
        &["fwhmLorentz#a", "c", "y", "y", "", "", "0"],
        &["fwhmLorentz#a", "w", "y", "y", "", "", "0.3"],
    ]);
    let parameters = ParameterTable::read(&mut t).unwrap();
    let res = resolve(&parameters, &ModelRegistry::with_builtins()).unwrap();

    // Voigt arguments are visited as A, c, w, m regardless of row order
    assert_eq!(res.model.signature(), "f(x, p0, p1, x0, p2, p3, p4)");
    assert_eq!(res.slots[3].terminal.arg, "A");
    assert_eq!(res.slots[2].guess, Some(0.3));
    assert_eq!(t.read_column("#").unwrap().len(), 7);
}
