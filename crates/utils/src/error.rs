//! Error types for utility functions.

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// The same (date, ticker) key appears more than once.
    #[error("duplicate panel key: date {date}, ticker {ticker}")]
    DuplicateKey {
        /// Date of the first duplicated key.
        date: String,
        /// Ticker of the first duplicated key.
        ticker: String,
    },
}
