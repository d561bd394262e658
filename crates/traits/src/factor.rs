//! Factor trait definitions.

use copbrief_primitives::{Horizon, ReturnMatrix};
use ndarray::Array1;

/// Errors that can occur during factor construction.
#[derive(Debug, thiserror::Error)]
pub enum FactorError {
    /// A ticker the factor cannot do without is absent from the matrix.
    #[error("missing required ticker: {0}")]
    MissingTicker(String),

    /// Empty input data.
    #[error("empty input data")]
    EmptyData,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The kind of factor in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorKind {
    /// Global driver (dollar index, oil).
    Global,
    /// Regional FX block.
    Regional,
    /// Local market risk.
    Local,
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Regional => write!(f, "regional"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// An explanatory factor derived from a standardized return matrix.
pub trait Factor: Send + Sync {
    /// Column name of the factor in the factor frame.
    fn name(&self) -> &str;

    /// Returns the kind of factor.
    fn kind(&self) -> FactorKind;

    /// Tickers the factor reads from the matrix.
    fn required_tickers(&self) -> Vec<&str>;

    /// Whether the factor is part of the model for `horizon`.
    fn applies_to(&self, _horizon: Horizon) -> bool {
        true
    }

    /// Compute the factor series for `horizon`, one value per matrix row.
    ///
    /// # Errors
    /// Returns `FactorError` when the factor cannot be built from `matrix`.
    fn compute(&self, matrix: &ReturnMatrix, horizon: Horizon) -> Result<Array1<f64>, FactorError>;
}

/// A factor with an associated configuration type.
pub trait ConfigurableFactor: Factor {
    /// Configuration type for this factor.
    type Config: Default + Clone + Send + Sync;

    /// Create a new factor with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Returns the factor's configuration.
    fn config(&self) -> &Self::Config;
}
