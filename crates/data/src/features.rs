//! Derived columns on the long close panel.

use polars::prelude::*;

use crate::DataError;

fn require(df: &DataFrame, columns: &[&str]) -> Result<(), DataError> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(DataError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Append the per-ticker daily percentage change of `close`.
///
/// Null closes are dropped first. Each ticker's first row has a null
/// `pct_change`. The output is sorted by `(date, ticker)`.
///
/// # Errors
/// Returns [`DataError::MissingColumn`] if `date`, `ticker` or `close` is absent.
pub fn add_pct_change(long: &DataFrame) -> Result<DataFrame, DataError> {
    require(long, &["date", "ticker", "close"])?;
    let df = long
        .clone()
        .lazy()
        .with_column(col("close").cast(DataType::Float64))
        .filter(col("close").is_not_null())
        .sort(["ticker", "date"], SortMultipleOptions::new().with_maintain_order(true))
        .with_column(
            (col("close") / col("close").shift(lit(1)).over([col("ticker")]) - lit(1.0))
                .alias("pct_change"),
        )
        .sort(["date", "ticker"], SortMultipleOptions::new().with_maintain_order(true))
        .collect()?;
    Ok(df)
}

/// Rows of the most recent date, sorted by ticker.
///
/// # Errors
/// Returns [`DataError::MissingColumn`] if `date` or `ticker` is absent.
pub fn daily_context(long: &DataFrame) -> Result<DataFrame, DataError> {
    require(long, &["date", "ticker"])?;
    if long.height() == 0 {
        return Ok(long.clone());
    }
    let df = long
        .clone()
        .lazy()
        .filter(col("date").eq(col("date").max()))
        .sort(["ticker"], SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}
