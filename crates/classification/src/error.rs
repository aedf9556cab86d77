//! Error types for classification.

use thiserror::Error;

/// Result type alias using ClassifyError.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors raised while computing class breaks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("unknown method, please provide a valid mapclassify method.")]
    UnknownMethod(String),

    #[error("no values to classify")]
    EmptyInput,

    #[error("values must be finite, found {0}")]
    NonFiniteValue(f64),

    #[error("{method} requires {parameter}")]
    MissingParameter {
        method: &'static str,
        parameter: &'static str,
    },

    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),

    #[error("not enough unique values in array to form {k} classes (found {unique})")]
    NotEnoughUniqueValues { k: usize, unique: usize },

    #[error("percentile {0} is outside [0, 100]")]
    PercentileOutOfRange(f64),

    #[error("bins must be finite and in increasing order")]
    UnorderedBins,

    #[error("bins must not be empty")]
    EmptyBins,
}
