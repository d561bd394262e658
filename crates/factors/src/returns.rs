//! Return aggregation over horizons.
//!
//! Compounding runs over plain ndarray windows instead of polars
//! `rolling_*` expressions: short leading windows still count their
//! non-null rows against `min_periods` and fall back to `0.0`, which a
//! fixed-window polars kernel would leave null.

use copbrief_primitives::{Horizon, ReturnMatrix};
use copbrief_traits::{TimeSeriesTransform, TransformError};
use ndarray::{Array1, ArrayView1, s};

/// Trailing compounded return, `prod(1 + r) - 1`.
///
/// The window ending at row `i` covers rows `[i - window + 1, i]`, truncated
/// at the start of the series. Windows with fewer than `min_periods`
/// observations yield `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundReturns {
    window: usize,
    min_periods: usize,
}

impl Default for CompoundReturns {
    fn default() -> Self {
        Self { window: 5, min_periods: 3 }
    }
}

impl CompoundReturns {
    /// Create a compounding transform.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidParameter`] if `window` is zero or
    /// `min_periods` exceeds `window`.
    pub fn try_new(window: usize, min_periods: usize) -> Result<Self, TransformError> {
        if window == 0 {
            return Err(TransformError::InvalidParameter("window must be positive".to_string()));
        }
        if min_periods > window {
            return Err(TransformError::InvalidParameter(format!(
                "min_periods {min_periods} exceeds window {window}"
            )));
        }
        Ok(Self { window, min_periods })
    }

    /// Rows per window.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Minimum observations for a defined return.
    #[must_use]
    pub const fn min_periods(&self) -> usize {
        self.min_periods
    }
}

impl TimeSeriesTransform for CompoundReturns {
    fn apply(&self, series: ArrayView1<'_, f64>) -> Array1<f64> {
        let n = series.len();
        let mut out = Array1::zeros(n);
        for i in 0..n {
            let start = (i + 1).saturating_sub(self.window);
            let window = series.slice(s![start..=i]);
            let mut count = 0usize;
            let mut growth = 1.0;
            for r in window.iter().filter(|r| !r.is_nan()) {
                count += 1;
                growth *= 1.0 + r;
            }
            if count >= self.min_periods {
                out[i] = growth - 1.0;
            }
        }
        out
    }

    fn name(&self) -> &str {
        "compound_returns"
    }
}

/// Raw returns of `panel` aggregated to `horizon`.
///
/// The 1-day horizon is the panel itself.
#[must_use]
pub fn returns_for_horizon(
    panel: &ReturnMatrix,
    horizon: Horizon,
    compounding: &CompoundReturns,
) -> ReturnMatrix {
    match horizon {
        Horizon::OneDay => panel.clone(),
        Horizon::FiveDay => compounding.apply_matrix(panel),
    }
}
