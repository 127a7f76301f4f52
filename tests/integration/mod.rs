//! End-to-end fits driven by a parameter table.

pub mod noisy;
pub mod properties;
#[cfg(feature = "csv-table")]
pub mod csv_table;
