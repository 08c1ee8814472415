//! Error types for the optimization crates.
//!
//! Every failure is fatal to the current run: the engines report errors
//! immediately and never retry, returning whatever partial progress exists.

use thiserror::Error;

/// Errors that can occur while configuring or running an optimizer.
#[derive(Debug, Clone, Error)]
pub enum DescentError {
    /// Location and gradient buffers disagree in length, or the domain is
    /// empty.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected buffer length
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// A line search was given a direction along which the objective does
    /// not initially decrease.
    ///
    /// The directional derivative `gᵀd` must be strictly negative.
    #[error("Search direction is not a descent direction: directional derivative {directional_derivative}")]
    NotDescentDirection {
        /// The offending value of `gᵀd`
        directional_derivative: f64,
    },

    /// A univariate search was started with a zero initial step magnitude.
    #[error("Initial step magnitude is zero")]
    ZeroInitialStep,

    /// A settings value is outside its valid range.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the invalid parameter
        reason: String,
    },

    /// The user-supplied objective or gradient evaluation failed.
    #[error("User function evaluation failed: {reason}")]
    UserFunction {
        /// Description of the evaluation failure
        reason: String,
    },
}

impl DescentError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create a NotDescentDirection error from the directional derivative.
    pub fn not_descent_direction(directional_derivative: f64) -> Self {
        Self::NotDescentDirection {
            directional_derivative,
        }
    }

    /// Create an InvalidParameter error with a custom reason.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Create a UserFunction error with a custom reason.
    pub fn user_function<S: Into<String>>(reason: S) -> Self {
        Self::UserFunction {
            reason: reason.into(),
        }
    }
}

/// Result type alias for operations that can produce a [`DescentError`].
pub type Result<T> = std::result::Result<T, DescentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DescentError::dimension_mismatch(3, 4);
        assert!(matches!(err, DescentError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 4");

        let err = DescentError::not_descent_direction(0.25);
        assert!(matches!(err, DescentError::NotDescentDirection { .. }));
        assert!(err.to_string().contains("0.25"));
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            DescentError::dimension_mismatch(2, 5),
            DescentError::not_descent_direction(1.0),
            DescentError::ZeroInitialStep,
            DescentError::invalid_parameter("curvature constant must be below one"),
            DescentError::user_function("objective returned NaN"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
