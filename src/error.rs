use thiserror::Error;

/// Structural failures of the reduction engine.
///
/// Out-of-domain values (probabilities outside `(0, 1)`, zero-sum
/// normalization, curves that never cross a target) are *not* errors: they
/// surface as `NaN` inside the result. Everything here means the input table
/// cannot be reduced at all and the caller has to decide how to report it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HazardError {
    /// A required column is absent from the table header.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// No column name matched any of the prefix rules.
    #[error("no column matches any of the prefixes {prefixes:?}")]
    NoMatchingColumn { prefixes: Vec<String> },

    /// A cell could not be interpreted as the type the column requires.
    #[error("row {row}, column '{column}': {reason}")]
    InvalidCell {
        row: usize,
        column: String,
        reason: String,
    },

    /// Filtering left nothing to reduce.
    #[error("no rows for poe={poe}, imt={imt}")]
    EmptySelection { poe: f64, imt: String },

    /// The table does not have the layout the parser expects.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// Parallel sequences differ in length.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type HazardResult<T> = Result<T, HazardError>;
