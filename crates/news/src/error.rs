//! Error types for news collection.

use copbrief_traits::SourceError;
use thiserror::Error;

/// Errors that can occur while scraping news.
#[derive(Debug, Error)]
pub enum NewsError {
    /// Network error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Page answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http {
        /// Status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CSS selector failed to parse.
    #[error("invalid selector {0}")]
    Selector(String),

    /// Sources file could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Article could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsError {
    /// Returns whether scraping can move on to the next page.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. } | Self::InvalidUrl(_))
    }
}

impl From<NewsError> for SourceError {
    fn from(err: NewsError) -> Self {
        match err {
            NewsError::Http { status, url } => Self::Api { status, body: url },
            NewsError::Network(e) => Self::Unavailable(e.to_string()),
            NewsError::Io(e) => Self::Io(e),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_are_recoverable() {
        let err = NewsError::Http { status: 404, url: "https://example.com/x".to_string() };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "HTTP 404 for https://example.com/x");
        let source: SourceError = err.into();
        assert!(matches!(source, SourceError::Api { status: 404, .. }));
    }

    #[test]
    fn selector_errors_are_fatal() {
        assert!(!NewsError::Selector("p[".to_string()).is_recoverable());
    }
}
