//! Parameter rows, `vary` rules and bounds.
//!
//! Every row of the control table describes one argument of one submodel.
//! This module holds the typed form of those rows and the helpers used to
//! interpret their cells.

pub mod bounds;
pub mod row;
pub mod vary;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use row::{ParameterKey, ParameterRow, SubmodelId};
pub use vary::VaryRule;
