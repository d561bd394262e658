//! Collaborator traits for the I/O stages around the relations core.

use std::future::Future;

use copbrief_primitives::{Article, Date, Ticker};
use polars::prelude::{DataFrame, PolarsError};

/// Errors raised by external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Remote service could not be reached or timed out.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Remote service answered with a non-success status.
    #[error("api error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Nothing was returned.
    #[error("no data returned: {0}")]
    NoData(String),

    /// Missing credentials or configuration.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Returns whether the daily run can continue with a placeholder.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Api { .. } | Self::NoData(_))
    }
}

/// Supplies end-of-day closing prices.
pub trait PriceSource: Send + Sync {
    /// Download daily closes for `tickers` covering the last `period_years`.
    ///
    /// The frame is long-format with columns `date` (Date), `ticker` (String)
    /// and `close` (Float64). Tickers that fail are left out.
    fn fetch_closes(
        &self,
        tickers: &[Ticker],
        period_years: u32,
    ) -> impl Future<Output = Result<DataFrame, SourceError>> + Send;
}

/// Supplies scored news articles.
pub trait NewsSource: Send + Sync {
    /// Fetch and score articles, keeping only relevant ones.
    fn fetch_articles(&self) -> impl Future<Output = Result<Vec<Article>, SourceError>> + Send;
}

/// Everything a narrative generator needs to write the daily briefing.
#[derive(Debug, Clone)]
pub struct NarrativeInput {
    /// Briefing date.
    pub date: Date,
    /// Markdown rendering of the latest market closes.
    pub market_table: String,
    /// Markdown rendering of the 1d and 5d relations tables.
    pub relations_table: String,
    /// Rule-based summary of the day's drivers.
    pub summary: String,
    /// Relevant articles, highest score first.
    pub articles: Vec<Article>,
}

/// Turns the relations output and news into prose.
pub trait NarrativeGenerator: Send + Sync {
    /// Write the briefing body as Markdown.
    fn generate(
        &self,
        input: &NarrativeInput,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// A newsletter issue ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Newsletter {
    /// Email subject line.
    pub subject: String,
    /// Markdown body.
    pub body: String,
    /// Keep the email as a draft instead of queueing it.
    pub draft_only: bool,
}

/// Delivers a briefing to readers.
pub trait Publisher: Send + Sync {
    /// Publish `issue`, returning the provider's identifier for it.
    fn publish(
        &self,
        issue: &Newsletter,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}
