//! Wide return matrix.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{Date, Ticker};

/// Date-indexed, ticker-columned matrix of returns.
///
/// Rows are sorted ascending by date. Missing observations are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<Date>,
    tickers: Vec<Ticker>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Create a new return matrix.
    ///
    /// `values` must have one row per date and one column per ticker.
    #[must_use]
    pub fn new(dates: Vec<Date>, tickers: Vec<Ticker>, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.nrows(), dates.len());
        debug_assert_eq!(values.ncols(), tickers.len());
        Self { dates, tickers, values }
    }

    /// Number of dates.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Number of tickers.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.tickers.len()
    }

    /// Check if the matrix has no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column tickers.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Underlying values (dates x tickers).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Most recent date, if any.
    #[must_use]
    pub fn last_date(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// Position of a ticker column.
    #[must_use]
    pub fn column_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t.as_str() == ticker)
    }

    /// Whether the matrix has a column for `ticker`.
    #[must_use]
    pub fn contains(&self, ticker: &str) -> bool {
        self.column_index(ticker).is_some()
    }

    /// View of a single ticker column.
    #[must_use]
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(ticker).map(|j| self.values.column(j))
    }

    /// Build a new matrix of the same shape by transforming every column.
    #[must_use]
    pub fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(ArrayView1<'_, f64>) -> Array1<f64>,
    {
        let mut values = Array2::from_elem(self.values.raw_dim(), f64::NAN);
        for (j, column) in self.values.axis_iter(Axis(1)).enumerate() {
            let transformed = f(column);
            debug_assert_eq!(transformed.len(), self.n_rows());
            values.column_mut(j).assign(&transformed);
        }
        Self { dates: self.dates.clone(), tickers: self.tickers.clone(), values }
    }

    /// Count of non-missing observations in a column.
    #[must_use]
    pub fn valid_count(&self, ticker: &str) -> usize {
        self.column(ticker).map_or(0, |c| c.iter().filter(|v| !v.is_nan()).count())
    }
}
