//! Settings of a fit session.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::fit::DEFAULT_GLOBAL_SIGMA;
use crate::lm::LmConfig;

/// Configuration of [`FitSession::fit`](crate::FitSession::fit).
///
/// Missing JSON fields fall back to their defaults:
///
/// ```
/// use sheetfit::FitConfig;
///
/// let config = FitConfig::from_json_str(r#"{ "save_after_fit": false, "lm": { "max_iterations": 50 } }"#).unwrap();
/// assert!(!config.save_after_fit);
/// assert_eq!(config.lm.max_iterations, 50);
/// assert_eq!(config.global_sigma, 1e-13);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// σ for every point outside a tie range.
    pub global_sigma: f64,
    /// Flush the table after the fitted values are written.
    pub save_after_fit: bool,
    /// Solver settings.
    pub lm: LmConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            global_sigma: DEFAULT_GLOBAL_SIGMA,
            save_after_fit: true,
            lm: LmConfig::default(),
        }
    }
}

impl FitConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
