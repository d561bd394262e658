//! Long-to-wide panel construction.

use std::collections::{BTreeSet, HashMap};

use chrono::TimeDelta;
use copbrief_primitives::{Date, ReturnMatrix, Ticker};
use copbrief_traits::TimeSeriesTransform;
use ndarray::Array2;
use polars::prelude::*;
use tracing::debug;

use crate::{ForwardFill, UtilsError};

/// Name of the date column of a long price table.
pub const DATE_COL: &str = "date";
/// Name of the ticker column of a long price table.
pub const TICKER_COL: &str = "ticker";
/// Name of the percentage-change column of a long price table.
pub const PCT_CHANGE_COL: &str = "pct_change";

/// Builds a wide [`ReturnMatrix`] from a long `(date, ticker, value)` table.
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    value_col: String,
    ffill_limit: usize,
}

impl Default for PanelBuilder {
    fn default() -> Self {
        Self { value_col: PCT_CHANGE_COL.to_string(), ffill_limit: 5 }
    }
}

impl PanelBuilder {
    /// Create a panel builder reading `pct_change` with a 5-row fill limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read values from `name` instead of `pct_change`.
    #[must_use]
    pub fn with_value_column(mut self, name: impl Into<String>) -> Self {
        self.value_col = name.into();
        self
    }

    /// Forward fill at most `limit` consecutive missing rows per ticker.
    #[must_use]
    pub const fn with_ffill_limit(mut self, limit: usize) -> Self {
        self.ffill_limit = limit;
        self
    }

    /// Column the values are read from.
    #[must_use]
    pub fn value_column(&self) -> &str {
        &self.value_col
    }

    /// Pivot `long` into a date x ticker matrix.
    ///
    /// Dates and tickers are sorted ascending. Cells without an observation
    /// are `NaN` before the forward fill.
    ///
    /// # Errors
    /// Returns [`UtilsError::MissingColumn`] when a required column is absent
    /// and [`UtilsError::DuplicateKey`] when a `(date, ticker)` pair repeats.
    pub fn build(&self, long: &DataFrame) -> Result<ReturnMatrix, UtilsError> {
        for name in [DATE_COL, TICKER_COL, self.value_col.as_str()] {
            if long.get_column_index(name).is_none() {
                return Err(UtilsError::MissingColumn(name.to_string()));
            }
        }

        ensure_unique_keys(long)?;

        let dates = column_dates(long, DATE_COL)?;
        let tickers_col = long.column(TICKER_COL)?.cast(&DataType::String)?;
        let tickers = tickers_col.str()?;
        let values_col = long.column(&self.value_col)?.cast(&DataType::Float64)?;
        let values = values_col.f64()?;

        let unique_dates: BTreeSet<Date> = dates.iter().flatten().copied().collect();
        let unique_tickers: BTreeSet<&str> = tickers.into_iter().flatten().collect();

        let date_index: HashMap<Date, usize> =
            unique_dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let ticker_index: HashMap<&str, usize> =
            unique_tickers.iter().enumerate().map(|(j, t)| (*t, j)).collect();

        let mut matrix = Array2::from_elem((unique_dates.len(), unique_tickers.len()), f64::NAN);
        let mut skipped = 0usize;
        for ((date, ticker), value) in dates.iter().zip(tickers.into_iter()).zip(values.into_iter())
        {
            let (Some(date), Some(ticker)) = (date, ticker) else {
                skipped += 1;
                continue;
            };
            if let Some(v) = value.filter(|v| v.is_finite()) {
                matrix[[date_index[date], ticker_index[ticker]]] = v;
            }
        }
        if skipped > 0 {
            debug!(skipped, "dropped rows without date or ticker");
        }

        let raw = ReturnMatrix::new(
            unique_dates.into_iter().collect(),
            unique_tickers.into_iter().map(Ticker::from).collect(),
            matrix,
        );
        let filled = ForwardFill::limited(self.ffill_limit).apply_matrix(&raw);

        debug!(
            rows = filled.n_rows(),
            tickers = filled.n_cols(),
            ffill_limit = self.ffill_limit,
            "built return panel"
        );
        Ok(filled)
    }
}

/// Pivot a long `(date, ticker, pct_change)` table with the default builder.
///
/// # Errors
/// See [`PanelBuilder::build`].
pub fn build_return_panel(long: &DataFrame) -> Result<ReturnMatrix, UtilsError> {
    PanelBuilder::default().build(long)
}

/// Fail with the first duplicated `(date, ticker)` key, if any.
///
/// # Errors
/// Returns [`UtilsError::DuplicateKey`] on the first repeated key in sort order.
pub fn ensure_unique_keys(long: &DataFrame) -> Result<(), UtilsError> {
    let duplicates = long
        .clone()
        .lazy()
        .group_by([col(DATE_COL), col(TICKER_COL)])
        .agg([len().alias("n")])
        .filter(col("n").gt(lit(1)))
        .sort([DATE_COL, TICKER_COL], SortMultipleOptions::default())
        .collect()?;

    if duplicates.height() == 0 {
        return Ok(());
    }

    let date = duplicates.column(DATE_COL)?.cast(&DataType::String)?;
    let ticker = duplicates.column(TICKER_COL)?.cast(&DataType::String)?;
    Err(UtilsError::DuplicateKey {
        date: date.str()?.get(0).unwrap_or_default().to_string(),
        ticker: ticker.str()?.get(0).unwrap_or_default().to_string(),
    })
}

/// Read a column as calendar dates.
///
/// Accepts `Date`, `Datetime` and ISO-formatted string columns.
///
/// # Errors
/// Returns [`UtilsError::MissingColumn`] if `name` is absent, or a polars
/// error if the column cannot be cast to `Date`.
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>, UtilsError> {
    let column = df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))?;
    let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    // NaiveDate::default() is 1970-01-01
    let epoch = Date::default();
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(|d| epoch.checked_add_signed(TimeDelta::try_days(i64::from(d))?)))
        .collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn date(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn long_frame(rows: &[(Date, &str, Option<f64>)]) -> DataFrame {
        let dates: Vec<Date> = rows.iter().map(|r| r.0).collect();
        let tickers: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.2).collect();
        DataFrame::new(vec![
            Column::new(DATE_COL.into(), dates),
            Column::new(TICKER_COL.into(), tickers),
            Column::new(PCT_CHANGE_COL.into(), values),
        ])
        .unwrap()
    }

    #[test]
    fn pivot_sorts_dates_and_tickers() {
        let df = long_frame(&[
            (date(3), "B", Some(0.3)),
            (date(2), "A", Some(0.1)),
            (date(3), "A", Some(0.2)),
            (date(2), "B", None),
        ]);
        let m = build_return_panel(&df).unwrap();

        assert_eq!(m.dates(), &[date(2), date(3)]);
        assert_eq!(m.tickers(), &[Ticker::new("A"), Ticker::new("B")]);
        assert_relative_eq!(m.column("A").unwrap()[1], 0.2);
        // First observation of B has no prior value to fill from
        assert!(m.column("B").unwrap()[0].is_nan());
    }

    #[test]
    fn duplicate_key_fails_loudly() {
        let df = long_frame(&[
            (date(2), "A", Some(0.1)),
            (date(2), "A", Some(0.2)),
            (date(3), "A", Some(0.3)),
        ]);
        let err = build_return_panel(&df).unwrap_err();
        match err {
            UtilsError::DuplicateKey { date, ticker } => {
                assert_eq!(date, "2024-01-02");
                assert_eq!(ticker, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_reported() {
        let df = long_frame(&[(date(2), "A", Some(0.1))]).drop(PCT_CHANGE_COL).unwrap();
        assert!(matches!(
            build_return_panel(&df),
            Err(UtilsError::MissingColumn(name)) if name == PCT_CHANGE_COL
        ));
    }

    #[test]
    fn gaps_fill_up_to_limit() {
        // A trades on all 9 days, B only on day 1 and day 9
        let mut rows = Vec::new();
        for d in 1..=9 {
            rows.push((date(d), "A", Some(0.01)));
        }
        rows.push((date(1), "B", Some(0.05)));
        rows.push((date(9), "B", Some(0.07)));
        let m = build_return_panel(&long_frame(&rows)).unwrap();

        let b = m.column("B").unwrap();
        for i in 1..=5 {
            assert_relative_eq!(b[i], 0.05);
        }
        assert!(b[6].is_nan());
        assert!(b[7].is_nan());
        assert_relative_eq!(b[8], 0.07);
    }

    #[test]
    fn custom_value_column_and_limit() {
        let df = DataFrame::new(vec![
            Column::new(DATE_COL.into(), vec![date(1), date(3), date(2)]),
            Column::new(TICKER_COL.into(), vec!["A", "A", "B"]),
            Column::new("ret".into(), vec![Some(1.0), Some(3.0), Some(2.0)]),
        ])
        .unwrap();

        let builder = PanelBuilder::new().with_value_column("ret").with_ffill_limit(0);
        assert_eq!(builder.value_column(), "ret");
        let m = builder.build(&df).unwrap();
        // Limit 0 disables the fill
        assert!(m.column("A").unwrap()[1].is_nan());
        assert_relative_eq!(m.column("B").unwrap()[1], 2.0);
    }

    #[test]
    fn dates_from_strings() {
        let df = DataFrame::new(vec![Column::new(DATE_COL.into(), vec!["2024-01-05", "2024-02-29"])])
            .unwrap();
        let dates = column_dates(&df, DATE_COL).unwrap();
        assert_eq!(dates, vec![Some(date(5)), Date::from_ymd_opt(2024, 2, 29)]);
    }
}
