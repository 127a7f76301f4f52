//! Fitting a CSV file in place.

use approx::assert_relative_eq;
use ndarray::Array1;
use sheetfit::models::fwhm_area_gauss;
use sheetfit::{CellValue, CsvTable, FitConfig, FitSession, TableSource};
use std::fs;
use std::io::Write;

const TABLE: &str = r#"submodel,arg,use,vary,min,max,guess,fitted,error,#,id
fwhmAreaGauss#1,A,y,y,0,,1,,,,
fwhmAreaGauss#1,c,y,y,,,0.1,,,,
fwhmAreaGauss#1,w,y,y,0.05,,1,,,,
fwhmAreaGauss#2,A,y,"fwhmAreaGauss#1,A",,,,,,,
,,,,,,,,,,
fwhmAreaGauss#2,c,y,n,,,3,,,,
fwhmAreaGauss#2,w,y,"fwhmAreaGauss#1,w",,,,,,,
"#;

fn write_table() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TABLE.as_bytes()).unwrap();
    file
}

fn data() -> (Array1<f64>, Array1<f64>) {
    let x = Array1::linspace(-4.0, 7.0, 221);
    let y = x.mapv(|v| fwhm_area_gauss(v, 1.5, 0.0, 0.9) + fwhm_area_gauss(v, 1.5, 3.0, 0.9));
    (x, y)
}

#[test]
fn fit_is_saved_back_to_the_file() {
    let file = write_table();
    let (x, y) = data();

    let mut session = FitSession::new(CsvTable::open(file.path()).unwrap());
    let report = session.fit(&x, &y, &[]).unwrap();
    assert_eq!(report.labels, vec!["p0", "p1", "p2"]);

    let reopened = CsvTable::open(file.path()).unwrap();
    let ids: Vec<String> = reopened
        .read_column("id")
        .unwrap()
        .iter()
        .map(|c| c.as_text())
        .collect();
    assert_eq!(ids, vec!["p0", "p1", "p2", "p0", "", "-", "p2"]);

    let hashtags: Vec<f64> = reopened
        .read_column("#")
        .unwrap()
        .iter()
        .filter_map(|c| c.as_number())
        .collect();
    assert_eq!(hashtags, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let fitted = reopened.read_column("fitted").unwrap();
    assert_relative_eq!(fitted[0].as_number().unwrap(), 1.5, epsilon = 1e-6);
    assert_relative_eq!(fitted[2].as_number().unwrap(), 0.9, epsilon = 1e-6);
    assert_eq!(fitted[3], fitted[0]);
    assert_eq!(fitted[5], CellValue::Number(3.0));
    assert_eq!(fitted[0].as_number(), Some(report.params[0]));
}

#[test]
fn save_after_fit_can_be_disabled() {
    let file = write_table();
    let (x, y) = data();
    let config = FitConfig {
        save_after_fit: false,
        ..FitConfig::default()
    };

    let mut session = FitSession::with_config(CsvTable::open(file.path()).unwrap(), config);
    session.fit(&x, &y, &[]).unwrap();
    assert!(session.table().as_memory().get(1, "fitted").unwrap().as_number().is_some());

    assert_eq!(fs::read_to_string(file.path()).unwrap(), TABLE);

    // Flushing by hand writes the same content the automatic save would
    let mut table = session.into_table();
    table.flush().unwrap();
    let saved = CsvTable::open(file.path()).unwrap();
    assert_eq!(saved.as_memory().get(4, "id").unwrap().as_text(), "p0");
}
