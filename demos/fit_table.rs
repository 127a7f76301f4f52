//! Fit a CSV parameter table to data.
//!
//! Usage:
//!
//! ```text
//! cargo run --example fit_table -- <table.csv> <data.csv> [start stop factor]...
//! ```
//!
//! `data.csv` holds two columns, x and y, with no header. Each trailing
//! triple adds a tie range. Without arguments the example writes a demo
//! table and a synthetic two-peak spectrum to the temp directory and fits
//! those. Set `RUST_LOG=debug` to follow the resolution and the solver.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use sheetfit::models::{fwhm_arctan, fwhm_gauss};
use sheetfit::utils::{extract, smooth_grid};
use sheetfit::{residue, CsvTable, FitSession, TieRange};

const DEMO_TABLE: &str = r#"submodel,arg,use,vary,min,max,guess,fitted,error,#,id
fwhmGauss#low,A,y,y,0,,1,,,,
fwhmGauss#low,c,y,y,,,-0.8,,,,
fwhmGauss#low,w,y,y,0.05,5,1,,,,
fwhmGauss#high,A,y,y,0,,0.5,,,,
fwhmGauss#high,c,y,y,,,1.8,,,,
fwhmGauss#high,w,y,"fwhmGauss#low,w",,,,,,,
fwhmArctan#edge,A,y,y,,,0.2,,,,
fwhmArctan#edge,c,y,n,,,0,,,,
fwhmArctan#edge,w,y,y,0.1,,1,,,,
"#;

fn read_data(path: &Path) -> Result<(Array1<f64>, Array1<f64>), Box<dyn Error>> {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;
    for record in reader.records() {
        let record = record?;
        x.push(record[0].parse::<f64>()?);
        y.push(record[1].parse::<f64>()?);
    }
    Ok((Array1::from(x), Array1::from(y)))
}

fn write_demo() -> Result<(PathBuf, Array1<f64>, Array1<f64>), Box<dyn Error>> {
    let path = std::env::temp_dir().join("sheetfit_demo_table.csv");
    fs::write(&path, DEMO_TABLE)?;

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.01)?;
    let x = Array1::linspace(-5.0, 5.0, 301);
    let y = x.mapv(|v| {
        fwhm_gauss(v, 1.2, -1.0, 0.9)
            + fwhm_gauss(v, 0.6, 2.0, 0.9)
            + fwhm_arctan(v, 0.3, 0.0, 1.5)
            + noise.sample(&mut rng)
    });
    Ok((path, x, y))
}

fn parse_ties(args: &[String]) -> Result<Vec<TieRange>, Box<dyn Error>> {
    let values = args
        .iter()
        .map(|a| a.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() % 3 != 0 {
        return Err("tie ranges are given as start stop factor triples".into());
    }
    Ok(values
        .chunks(3)
        .map(|c| TieRange::new(c[0], c[1], c[2]))
        .collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (table_path, x, y, ties) = if args.len() >= 2 {
        let (x, y) = read_data(Path::new(&args[1]))?;
        (PathBuf::from(&args[0]), x, y, parse_ties(&args[2..])?)
    } else {
        let (path, x, y) = write_demo()?;
        (path, x, y, vec![TieRange::new(1.0, 3.0, 10.0)])
    };

    println!("Table-driven fit");
    println!("================\n");
    println!("table: {}", table_path.display());
    println!("data:  {} points\n", x.len());

    let mut session = FitSession::new(CsvTable::open(&table_path)?);
    let state = session.update_model()?;
    println!("model: {}", state.model);
    println!("       {}\n", state.model.signature());

    let report = session.fit(&x, &y, &ties)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let state = session.state().ok_or("no model after fit")?;
    let fine = smooth_grid(&x, 4);
    println!("\nComponent maxima on a {}-point grid:", fine.len());
    for curves in state.submodel_curves(&fine)? {
        let peak = curves.fit.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("  {:<18} {:.4}", curves.submodel.to_string(), peak);
    }

    let (x_low, y_low) = extract(&x, &y, &[(x[0] - 1.0, 0.0)]);
    let params = state.fitted.to_vec();
    println!(
        "residue below x = 0: {:.4e}",
        residue(&state.model, &x_low, &y_low, &params)?
    );

    println!("\nFitted values written back to {}", table_path.display());
    Ok(())
}
