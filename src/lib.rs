//! # sheetfit
//!
//! `sheetfit` fits a sum of peak and step functions to 1D data, where the
//! model is described by a parameter table rather than by code.
//!
//! Each table row names a submodel (`fwhmGauss#peak1`), one of its
//! arguments, whether that row is in use, and how the value behaves:
//! free (`y`), fixed (`n`), or tied to another parameter (`submodel,arg`).
//! The library reads the table, resolves the links into a composite model,
//! runs a bounded, weighted Levenberg-Marquardt fit and writes the fitted
//! values and their standard errors back into the table.
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use sheetfit::table::{columns, MemoryTable};
//! use sheetfit::{models::fwhm_gauss, FitSession};
//!
//! let mut table = MemoryTable::new(&columns::REQUIRED);
//! for row in [
//!     ["fwhmGauss#1", "A", "y", "y", "0", "", "1", "", "", "", ""],
//!     ["fwhmGauss#1", "c", "y", "y", "", "", "0.2", "", "", "", ""],
//!     ["fwhmGauss#1", "w", "y", "y", "0.01", "", "1", "", "", "", ""],
//! ] {
//!     table.push_text_row(&row);
//! }
//!
//! let x = Array1::linspace(-3.0, 3.0, 101);
//! let y = x.mapv(|v| fwhm_gauss(v, 2.0, 0.0, 0.8));
//!
//! let mut session = FitSession::new(table);
//! let report = session.fit(&x, &y, &[]).unwrap();
//! assert_eq!(report.signature, "f(x, p0, p1, p2)");
//! assert!((report.params[0] - 2.0).abs() < 1e-6);
//! ```

pub mod composite;
pub mod config;
pub mod error;
pub mod fit;
pub mod lm;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod resolve;
pub mod session;
pub mod table;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use composite::{ArgBinding, CompositeModel, ModelState, SubmodelCurves, Term};
pub use config::FitConfig;
pub use error::{FitError, Result};
pub use fit::{curve_fit, fake_sigma, residue, CurveFitResult, TieRange};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use models::{ModelFunction, ModelRegistry};
pub use parameters::{Bounds, ParameterKey, ParameterRow, SubmodelId, VaryRule};
pub use problem::Problem;
pub use resolve::{resolve, Resolution};
pub use session::{FitReport, FitSession};
#[cfg(feature = "csv-table")]
pub use table::CsvTable;
pub use table::{CellValue, MemoryTable, ParameterTable, TableSource};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
