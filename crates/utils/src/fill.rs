//! Gap filling utilities.

use copbrief_traits::TimeSeriesTransform;
use ndarray::{Array1, ArrayView1};

/// Forward fill of missing values with an optional run-length limit.
///
/// With `limit = Some(n)`, at most `n` consecutive missing values after an
/// observation are filled; the rest of a longer gap stays missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardFill {
    limit: Option<usize>,
}

impl ForwardFill {
    /// Create a forward fill with the given limit.
    #[must_use]
    pub const fn new(limit: Option<usize>) -> Self {
        Self { limit }
    }

    /// Forward fill at most `limit` consecutive missing values.
    #[must_use]
    pub const fn limited(limit: usize) -> Self {
        Self::new(Some(limit))
    }

    /// Maximum run of filled values, `None` when unlimited.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl TimeSeriesTransform for ForwardFill {
    fn apply(&self, series: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut out = series.to_owned();
        let mut last: Option<f64> = None;
        let mut run = 0usize;

        for value in &mut out {
            if value.is_nan() {
                if let Some(prev) = last {
                    if self.limit.is_none_or(|limit| run < limit) {
                        *value = prev;
                    }
                    run += 1;
                }
            } else {
                last = Some(*value);
                run = 0;
            }
        }

        out
    }

    fn name(&self) -> &str {
        "forward_fill"
    }
}
