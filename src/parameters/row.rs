//! Typed rows of the control table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::vary::VaryRule;

/// A submodel identifier of the form `name#tag`.
///
/// `name` selects the registered model function; the optional `tag`
/// distinguishes repeated instances of the same function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmodelId {
    raw: String,
}

impl SubmodelId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }

    /// The full identifier as written in the table.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The model function name (text before the first `#`).
    pub fn name(&self) -> &str {
        match self.raw.split_once('#') {
            Some((name, _)) => name,
            None => &self.raw,
        }
    }

    /// The instance tag (text after the last `#`), if any.
    pub fn tag(&self) -> Option<&str> {
        self.raw.rsplit_once('#').map(|(_, tag)| tag)
    }
}

impl fmt::Display for SubmodelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Address of one logical parameter: a submodel and one of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterKey {
    pub submodel: String,
    pub arg: String,
}

impl ParameterKey {
    pub fn new(submodel: impl Into<String>, arg: impl Into<String>) -> Self {
        Self {
            submodel: submodel.into(),
            arg: arg.into(),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.submodel, self.arg)
    }
}

/// One data row of the control table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub submodel: SubmodelId,
    pub arg: String,
    /// `use == "y"`
    pub active: bool,
    /// `None` when the cell is blank.
    pub vary: Option<VaryRule>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub guess: Option<f64>,
    pub fitted: Option<f64>,
    pub error: Option<f64>,
    /// 0-based data row index; the row sits at table row `hashtag + 1`.
    pub hashtag: usize,
}

impl ParameterRow {
    pub fn key(&self) -> ParameterKey {
        ParameterKey::new(self.submodel.as_str(), self.arg.as_str())
    }
}
