//! Box bounds for free parameters.
//!
//! Blank `min`/`max` cells become infinite bounds. During the fit the solver
//! works on unbounded internal values and the Minuit-style transforms below
//! map them back into `[min, max]`, the same way lmfit does it.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Guess {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        // JSON has no infinity, so open ends are written as null
        let mut state = serializer.serialize_struct("Bounds", 2)?;
        let min = self.has_lower_bound().then_some(self.min);
        let max = self.has_upper_bound().then_some(self.max);
        state.serialize_field("min", &min)?;
        state.serialize_field("max", &max)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Ok(Bounds::from_cells(helper.min, helper.max))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds, rejecting `min >= max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheetfit::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Build bounds from the `min` and `max` table cells; blank cells are open ends.
    pub fn from_cells(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.unwrap_or(NEG_INFINITY),
            max: max.unwrap_or(INFINITY),
        }
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Validate the bounds themselves and an initial value against them.
    ///
    /// An empty interval (`min == max`) is rejected; a pinned value is a
    /// fixed parameter, not a bounded one.
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        if self.min >= self.max {
            return Err(BoundsError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        if !value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        if !self.is_within_bounds(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Move a start value that sits on (or within rounding of) a bound
    /// slightly inside.
    ///
    /// The bounded transforms have zero slope at the bounds, so a solver
    /// started exactly there sees a zero Jacobian column for the parameter.
    pub fn interior_start(&self, value: f64) -> f64 {
        let mut offset = BOUNDARY_OFFSET * value.abs().max(1.0);
        if self.has_lower_bound() && self.has_upper_bound() {
            offset = offset.min(BOUNDARY_OFFSET * (self.max - self.min));
        }
        if self.has_lower_bound() && value < self.min + offset {
            self.min + offset
        } else if self.has_upper_bound() && value > self.max - offset {
            self.max - offset
        } else {
            value
        }
    }
}

/// Relative distance [`Bounds::interior_start`] keeps from a bound.
const BOUNDARY_OFFSET: f64 = 1e-4;

/// Minuit-style mapping between unbounded internal values and bounded external values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Transform an internal parameter value to an external value
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => b.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => b.min + (internal_value.sin() + 1.0) * (b.max - b.min) / 2.0,
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// Fails when the external value is not finite or lies outside the bounds.
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        self.bounds.check(external_value)?;

        let b = &self.bounds;
        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external_value - b.min) / (b.max - b.min) - 1.0;
                // Ensure scaled is in [-1, 1] for asin
                scaled.clamp(-1.0, 1.0).asin()
            }
        };
        Ok(internal)
    }
}
