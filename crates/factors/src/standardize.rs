//! Rolling standardization.
//!
//! Windows are walked directly over ndarray columns rather than through
//! polars rolling expressions: each element needs its own neutral value and
//! non-null count, which the fixed-window polars kernels do not expose.

use copbrief_math::{nan_mean, nan_std, valid_count};
use copbrief_traits::{TimeSeriesTransform, TransformError};
use ndarray::{Array1, ArrayView1, s};

/// Trailing-window z-score.
///
/// The window ending at row `i` covers rows `[i - window + 1, i]`. Rows
/// before the first full window are `0.0`. Past that, output is `0.0`
/// whenever the window holds fewer than `min_periods` observations, the
/// current value is missing or the window's sample standard deviation is
/// not positive. The result never contains `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingZScore {
    window: usize,
    min_periods: usize,
}

impl Default for RollingZScore {
    fn default() -> Self {
        Self { window: 90, min_periods: 10 }
    }
}

impl RollingZScore {
    /// Create a z-score transform.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidParameter`] unless
    /// `2 <= min_periods <= window`.
    pub fn try_new(window: usize, min_periods: usize) -> Result<Self, TransformError> {
        if min_periods < 2 || min_periods > window {
            return Err(TransformError::InvalidParameter(format!(
                "need 2 <= min_periods <= window, got min_periods {min_periods}, window {window}"
            )));
        }
        Ok(Self { window, min_periods })
    }

    /// Rows per window.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Minimum observations for a non-neutral score.
    #[must_use]
    pub const fn min_periods(&self) -> usize {
        self.min_periods
    }
}

impl TimeSeriesTransform for RollingZScore {
    fn apply(&self, series: ArrayView1<'_, f64>) -> Array1<f64> {
        let n = series.len();
        let mut out = Array1::zeros(n);
        for i in self.window.saturating_sub(1)..n {
            let value = series[i];
            if value.is_nan() {
                continue;
            }
            let window = series.slice(s![i + 1 - self.window..=i]);
            if valid_count(&window) < self.min_periods {
                continue;
            }
            let (Some(mean), Some(std)) = (nan_mean(&window), nan_std(&window)) else {
                continue;
            };
            if std > 0.0 {
                let z = (value - mean) / std;
                if z.is_finite() {
                    out[i] = z;
                }
            }
        }
        out
    }

    fn name(&self) -> &str {
        "rolling_zscore"
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    /// A full 90-row window whose last `valid` rows are observed.
    fn series_with_valid(valid: usize) -> Array1<f64> {
        let mut data: Vec<f64> = vec![f64::NAN; 90];
        for (k, v) in data.iter_mut().rev().take(valid).enumerate() {
            *v = (k as f64 * 0.37).sin();
        }
        Array1::from(data)
    }

    #[rstest]
    #[case(9, true)]
    #[case(10, false)]
    fn minimum_observation_boundary(#[case] valid: usize, #[case] neutral: bool) {
        let series = series_with_valid(valid);
        let out = RollingZScore::default().apply(series.view());
        let last = out[series.len() - 1];
        assert_eq!(last == 0.0, neutral, "valid={valid} z={last}");
    }

    #[test]
    fn zscore_matches_window_moments() {
        let series = Array1::from_iter((0..95).map(|k| (f64::from(k) * 0.3).sin()));
        let out = RollingZScore::default().apply(series.view());
        let window = series.slice(s![5..95]);
        let mean = nan_mean(&window).unwrap();
        let std = nan_std(&window).unwrap();
        assert_relative_eq!(out[94], (series[94] - mean) / std, epsilon = 1e-12);
    }

    #[test]
    fn leading_partial_windows_are_neutral() {
        let series = Array1::from_iter((0..95).map(|k| f64::from(k % 11) * 0.1));
        let out = RollingZScore::default().apply(series.view());
        assert!(out.slice(s![..89]).iter().all(|v| *v == 0.0));
        assert!(out[89] != 0.0);

        let short = RollingZScore::try_new(20, 10).unwrap().apply(series.view());
        assert!(short.slice(s![..19]).iter().all(|v| *v == 0.0));
        assert!(short[19] != 0.0);
    }

    #[test]
    fn window_is_trailing() {
        let mut data = vec![100.0; 50];
        data.extend((0..100).map(|k| f64::from(k % 7)));
        let series = Array1::from(data);
        let zscore = RollingZScore::try_new(90, 10).unwrap();
        let out = zscore.apply(series.view());

        // Last window holds only the periodic tail
        let tail = series.slice(s![60..150]);
        let expected = (series[149] - nan_mean(&tail).unwrap()) / nan_std(&tail).unwrap();
        assert_relative_eq!(out[149], expected, epsilon = 1e-12);
    }

    #[test]
    fn constant_window_is_neutral() {
        let series = Array1::from_elem(30, 0.02);
        let out = RollingZScore::default().apply(series.view());
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_current_value_is_neutral() {
        let mut series = Array1::from_iter((0..100).map(f64::from));
        series[99] = f64::NAN;
        let out = RollingZScore::default().apply(series.view());
        assert_eq!(out[99], 0.0);
        assert!(out[98] != 0.0);
        assert!(out.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(RollingZScore::try_new(90, 1).is_err());
        assert!(RollingZScore::try_new(5, 10).is_err());
    }
}
