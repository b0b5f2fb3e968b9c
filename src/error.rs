//! Error types for the anofox-hctsa library.
//!
//! Only interface misuse surfaces as an error. Data-driven failures (short
//! series, zero variance, unresolvable lags) are reported as NaN values plus
//! a `log::warn!` diagnostic.

use thiserror::Error;

/// Result type alias for feature operations.
pub type Result<T> = std::result::Result<T, HctsaError>;

/// Errors that can occur when calling a feature operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HctsaError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// The requested computation cannot be carried out on a series this short.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Unknown method name, out-of-range value or contradictory options.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two inputs that must have equal length do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Computation error (e.g. a symbol could not be assigned).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// The external mutual-information estimator is unavailable or failed.
    #[error("external estimator failure: {0}")]
    ExternalFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = HctsaError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = HctsaError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = HctsaError::InvalidParameter("unknown binning method 'foo'".to_string());
        assert_eq!(
            err.to_string(),
            "invalid parameter: unknown binning method 'foo'"
        );

        let err = HctsaError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");

        let err = HctsaError::ExternalFailure("kraskov estimator not available".to_string());
        assert_eq!(
            err.to_string(),
            "external estimator failure: kraskov estimator not available"
        );
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = HctsaError::ComputationError("unassigned symbol".into());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
        assert_ne!(err1, HctsaError::EmptyData);
    }
}
