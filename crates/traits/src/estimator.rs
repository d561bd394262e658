//! Window regression estimator trait definitions.

use ndarray::{Array1, Array2};

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// Dimension mismatch in input data.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// Insufficient data for estimation.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Singular or otherwise unsolvable system.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Fit produced NaN or infinite coefficients.
    #[error("non-finite coefficients")]
    NonFinite,
}

impl EstimatorError {
    /// Returns whether this error is recoverable.
    ///
    /// Recoverable errors are local to one window; the rolling regressor
    /// substitutes a fallback and moves on.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::LinearAlgebra(_) | Self::NonFinite)
    }
}

/// Fits coefficients on a single regression window.
pub trait WindowEstimator: Send + Sync {
    /// Fit coefficients of `y` on the columns of `x`.
    ///
    /// `x` already contains the intercept column when one is wanted; the
    /// returned vector has one entry per column of `x`.
    ///
    /// # Errors
    /// Returns `EstimatorError` if dimensions mismatch or the fit fails.
    fn fit(&self, y: &Array1<f64>, x: &Array2<f64>) -> Result<Array1<f64>, EstimatorError>;

    /// Returns the name of this estimator.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_error_is_recoverable() {
        let err = EstimatorError::InsufficientData { required: 30, actual: 5 };
        assert!(err.is_recoverable());
        assert!(EstimatorError::NonFinite.is_recoverable());

        let err = EstimatorError::DimensionMismatch {
            expected: 90,
            actual: 89,
            context: "target".to_string(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn estimator_error_display() {
        let err = EstimatorError::DimensionMismatch {
            expected: 100,
            actual: 50,
            context: "returns".to_string(),
        };
        assert_eq!(err.to_string(), "dimension mismatch for returns: expected 100, got 50");
    }
}
