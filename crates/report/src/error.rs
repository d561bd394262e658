//! Error types for exports, narration and delivery.

use copbrief_traits::SourceError;
use thiserror::Error;

/// Errors that can occur while writing reports or calling delivery APIs.
#[derive(Debug, Error)]
pub enum ReportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error while reading market data.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// HTTP transport error.
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote API answered with an error status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Response lacked an expected field.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials or settings are missing.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl ReportError {
    /// Returns whether the daily run can fall back to a placeholder.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::InvalidResponse(_) | Self::NotConfigured(_)
        )
    }
}

impl From<ReportError> for SourceError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Api { status, body } => Self::Api { status, body },
            ReportError::Network(e) => Self::Unavailable(e.to_string()),
            ReportError::NotConfigured(what) => Self::NotConfigured(what),
            ReportError::Io(e) => Self::Io(e),
            ReportError::Polars(e) => Self::Polars(e),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_through() {
        let err = ReportError::Api { status: 401, body: "bad token".to_string() };
        assert_eq!(err.to_string(), "API error 401: bad token");
        assert!(err.is_recoverable());
        let source: SourceError = err.into();
        assert!(matches!(source, SourceError::Api { status: 401, .. }));
    }

    #[test]
    fn missing_key_is_not_configured() {
        let source: SourceError = ReportError::NotConfigured("LLM_API_KEY".to_string()).into();
        assert!(matches!(source, SourceError::NotConfigured(k) if k == "LLM_API_KEY"));
    }
}
