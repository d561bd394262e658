//! Error types for market-data operations.

use copbrief_traits::SourceError;
use polars::prelude::PolarsError;
use thiserror::Error;
use yahoo_finance_api::YahooError;

/// Errors that can occur while downloading or persisting prices.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error.
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// A ticker returned no usable quotes.
    #[error("missing data for {ticker}: {reason}")]
    MissingData {
        /// Ticker that was queried.
        ticker: String,
        /// Why nothing came back.
        reason: String,
    },

    /// Timestamp could not be converted.
    #[error("time conversion error: {0}")]
    TimeConversion(String),

    /// Column required by a transformation is absent.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Returns whether the remaining tickers can still be fetched.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::YahooApi(_) | Self::MissingData { .. })
    }
}

impl From<YahooError> for DataError {
    fn from(err: YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}

impl From<DataError> for SourceError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::YahooApi(msg) => Self::Unavailable(msg),
            DataError::MissingData { ticker, reason } => Self::NoData(format!("{ticker}: {reason}")),
            DataError::Polars(e) => Self::Polars(e),
            DataError::Io(e) => Self::Io(e),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}
