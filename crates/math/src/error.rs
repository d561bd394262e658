//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// More parameters than observations.
    #[error("underdetermined system: {observations} observations for {parameters} parameters")]
    Underdetermined {
        /// Number of observations.
        observations: usize,
        /// Number of parameters.
        parameters: usize,
    },

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Numerical instability (NaN or Inf).
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}
