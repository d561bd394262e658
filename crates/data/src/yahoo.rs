//! Daily closes from Yahoo Finance.

use std::time::Duration;

use copbrief_primitives::{Date, Ticker};
use copbrief_traits::{PriceSource, SourceError};
use polars::prelude::*;
use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use yahoo_finance_api as yahoo;

use crate::DataError;

/// Calendar days requested for a history of `period_years`.
#[must_use]
pub const fn history_days(period_years: u32) -> i64 {
    365 * period_years as i64 + 7
}

/// Build a long `(date, ticker, close)` frame from raw quote timestamps.
///
/// Non-finite closes are dropped. When several quotes share a UTC date the
/// last one wins, so an intraday print never duplicates a daily close.
///
/// # Errors
/// Returns [`DataError::TimeConversion`] for timestamps outside the
/// representable range.
pub fn closes_frame(ticker: &str, timestamps: &[i64], closes: &[f64]) -> Result<DataFrame, DataError> {
    let mut dates: Vec<Date> = Vec::with_capacity(timestamps.len());
    let mut values: Vec<f64> = Vec::with_capacity(timestamps.len());

    for (&ts, &close) in timestamps.iter().zip(closes) {
        if !close.is_finite() {
            continue;
        }
        let date = utc_date(ts)?;
        if dates.last() == Some(&date) {
            if let Some(last) = values.last_mut() {
                *last = close;
            }
            continue;
        }
        dates.push(date);
        values.push(close);
    }

    let n = dates.len();
    let df = DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("ticker".into(), vec![ticker; n]),
        Column::new("close".into(), values),
    ])?;
    Ok(df)
}

fn utc_date(timestamp: i64) -> Result<Date, DataError> {
    let date = OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))?
        .date();
    Date::from_ymd_opt(date.year(), u8::from(date.month()).into(), date.day().into())
        .ok_or_else(|| DataError::TimeConversion(format!("invalid date {date}")))
}

/// Yahoo Finance price source with a fixed delay between requests.
pub struct YahooPriceSource {
    connector: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceSource")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceSource {
    /// Create a source with a 250 ms delay between tickers.
    ///
    /// # Errors
    /// Returns [`DataError::YahooApi`] if the HTTP client cannot be built.
    pub fn try_new() -> Result<Self, DataError> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a source with a custom delay between tickers.
    ///
    /// # Errors
    /// Returns [`DataError::YahooApi`] if the HTTP client cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self, DataError> {
        Ok(Self { connector: yahoo::YahooConnector::new()?, rate_limit_delay })
    }

    /// Fetch daily closes for one ticker between `start` and `end`.
    ///
    /// # Errors
    /// Returns [`DataError::MissingData`] when Yahoo answers with no quotes.
    pub async fn fetch_ticker(
        &self,
        ticker: &Ticker,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<DataFrame, DataError> {
        let response = self.connector.get_quote_history(ticker.as_str(), start, end).await?;
        let quotes = response.quotes()?;
        if quotes.is_empty() {
            return Err(DataError::MissingData {
                ticker: ticker.to_string(),
                reason: "no quotes returned".to_string(),
            });
        }

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let df = closes_frame(ticker.as_str(), &timestamps, &closes)?;
        if df.height() == 0 {
            return Err(DataError::MissingData {
                ticker: ticker.to_string(),
                reason: "all closes missing".to_string(),
            });
        }
        debug!(%ticker, rows = df.height(), "downloaded closes");
        Ok(df)
    }
}

impl PriceSource for YahooPriceSource {
    async fn fetch_closes(&self, tickers: &[Ticker], period_years: u32) -> Result<DataFrame, SourceError> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(history_days(period_years));

        let mut frames = Vec::with_capacity(tickers.len());
        for (i, ticker) in tickers.iter().enumerate() {
            if i > 0 {
                sleep(self.rate_limit_delay).await;
            }
            match self.fetch_ticker(ticker, start, end).await {
                Ok(df) => frames.push(df.lazy()),
                Err(err) => warn!(%ticker, %err, "skipping ticker"),
            }
        }

        if frames.is_empty() {
            return Err(DataError::MissingData {
                ticker: "all".to_string(),
                reason: "no ticker returned data".to_string(),
            }
            .into());
        }

        let fetched = frames.len();
        let combined = concat(frames, UnionArgs::default())?
            .sort(["date", "ticker"], SortMultipleOptions::new().with_maintain_order(true))
            .collect()?;
        info!(requested = tickers.len(), fetched, rows = combined.height(), "price download finished");
        Ok(combined)
    }
}
