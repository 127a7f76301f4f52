use thiserror::Error;

use crate::parameters::bounds::BoundsError;

/// Error types for the sheetfit library.
#[derive(Error, Debug)]
pub enum FitError {
    /// An active submodel has no `use == "y"` row for one of its function arguments.
    #[error("Submodel '{submodel}' is missing argument '{arg}'.")]
    MissingArgument { submodel: String, arg: String },

    /// A `vary` link points at a parameter that is not in the table.
    #[error("Cannot find submodel '{}' with arg '{}' (referenced by '{from}').", .target.submodel, .target.arg)]
    UnresolvedReference {
        from: String,
        target: crate::parameters::ParameterKey,
    },

    /// A chain of `vary` links loops back on itself.
    #[error("Cyclic vary reference: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// Free parameters without a guess value, reported all at once.
    #[error("Parameters with id {ids:?} do not have a guess value.")]
    MissingGuess { ids: Vec<String> },

    /// A fixed parameter (or a link ending at one) has no guess to substitute.
    #[error("Fixed parameter '{submodel},{arg}' does not have a guess value.")]
    MissingFixedValue { submodel: String, arg: String },

    /// An active row carries a `vary` cell that cannot be interpreted.
    #[error("Invalid vary value for '{submodel},{arg}': '{value}'")]
    InvalidVary {
        submodel: String,
        arg: String,
        value: String,
    },

    /// The control table does not have the expected shape or content.
    #[error("Malformed table at row {row}: {reason}")]
    MalformedTable { row: usize, reason: String },

    /// The submodel name is not present in the model registry.
    #[error("Unknown model function '{0}'")]
    UnknownModel(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error indicating the solver failed to converge.
    #[error("Optimal parameters not found: {0}")]
    ConvergenceFailure(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// σ values must be positive and finite.
    #[error("Invalid sigma: {0}")]
    InvalidSigma(String),

    /// Boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Table cell addressing outside the table.
    #[error("Cell ({row}, {col}) is outside the table")]
    CellOutOfRange { row: usize, col: usize },

    /// A column name that is not in the header.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// CSV read/write error.
    #[cfg(feature = "csv-table")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sheetfit operations.
pub type Result<T> = std::result::Result<T, FitError>;
