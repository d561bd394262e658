//! Error types for factor construction.

use copbrief_traits::{FactorError, TransformError};

/// Errors that can occur while building factor frames.
#[derive(Debug, thiserror::Error)]
pub enum FactorsError {
    /// Factor computation error.
    #[error("factor error: {0}")]
    Factor(#[from] FactorError),

    /// Transform configuration error.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Inconsistent frame dimensions.
    #[error("shape error: {0}")]
    Shape(String),
}

impl FactorsError {
    /// The ticker whose absence caused this error, if any.
    #[must_use]
    pub fn missing_ticker(&self) -> Option<&str> {
        match self {
            Self::Factor(FactorError::MissingTicker(t)) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FactorsError::Shape("bad".to_string());
        assert!(err.to_string().contains("bad"));

        let err = FactorsError::from(FactorError::MissingTicker("BZ=F".to_string()));
        assert_eq!(err.missing_ticker(), Some("BZ=F"));
    }
}
