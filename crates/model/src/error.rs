//! Error types for the relations engine.

use copbrief_factors::FactorsError;
use copbrief_traits::{EstimatorError, TransformError};
use copbrief_utils::UtilsError;

/// Errors that can occur while computing factor relations.
///
/// Data sparsity never produces an error; only malformed input does.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Panel construction error.
    #[error("panel error: {0}")]
    Panel(#[from] UtilsError),

    /// Factor frame error.
    #[error("factor error: {0}")]
    Factors(#[from] FactorsError),

    /// Transform configuration error.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Estimator error.
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A ticker the engine cannot do without is absent from the panel.
    #[error("missing required ticker: {0}")]
    MissingTicker(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl ModelError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Estimator(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// The ticker whose absence caused this error, if any.
    #[must_use]
    pub fn missing_ticker(&self) -> Option<&str> {
        match self {
            Self::MissingTicker(t) => Some(t),
            Self::Factors(e) => e.missing_ticker(),
            _ => None,
        }
    }
}
