//! Rolling window regression.

use copbrief_factors::FactorFrame;
use copbrief_math::{MathError, nan_mean, ordinary_least_squares, valid_count};
use copbrief_primitives::{FactorName, Horizon};
use copbrief_traits::{EstimatorError, WindowEstimator};
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, s};
use tracing::{debug, info};

use crate::ModelError;

type WindowFit = Result<(Array1<f64>, Option<f64>), FallbackReason>;

/// Ordinary least squares on a single window.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsEstimator;

impl WindowEstimator for OlsEstimator {
    fn fit(&self, y: &Array1<f64>, x: &Array2<f64>) -> Result<Array1<f64>, EstimatorError> {
        let result = ordinary_least_squares(y, x).map_err(|e| match e {
            MathError::DimensionMismatch { expected, actual } => EstimatorError::DimensionMismatch {
                expected,
                actual,
                context: "design matrix rows".to_string(),
            },
            MathError::Underdetermined { observations, parameters } => {
                EstimatorError::InsufficientData { required: parameters, actual: observations }
            }
            MathError::EmptyData => EstimatorError::InsufficientData { required: 1, actual: 0 },
            MathError::NumericalInstability(_) => EstimatorError::NonFinite,
            MathError::LinearAlgebra(msg) => EstimatorError::LinearAlgebra(msg),
        })?;
        Ok(result.coefficients)
    }

    fn name(&self) -> &str {
        "ols"
    }
}

/// Why a date's coefficients were not fitted.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Too few complete rows in the window.
    InsufficientData {
        /// Complete rows found.
        valid: usize,
        /// Complete rows required.
        required: usize,
    },
    /// The fit failed or produced non-finite coefficients.
    Numerical(String),
}

/// How a date's coefficients came about.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// Not enough history for a full window.
    Warmup,
    /// Coefficients fitted on the date's window.
    Fitted,
    /// No usable fit.
    Fallback {
        /// Why the fit was not used.
        reason: FallbackReason,
        /// Whether the mean of earlier coefficients was substituted.
        restored: bool,
    },
}

impl FitOutcome {
    /// Check if the date carries coefficients.
    #[must_use]
    pub const fn has_coefficients(&self) -> bool {
        matches!(self, Self::Fitted | Self::Fallback { restored: true, .. })
    }

    /// Check if the date fell back.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Windows and guards of the rolling regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegressionConfig {
    /// Rows in each window. The window of date `i` is `[i - window, i)`.
    pub window: usize,
    /// Complete rows required to attempt a fit.
    pub min_observations: usize,
    /// Rows of target history behind the R² denominator.
    pub r2_lookback: usize,
    /// Valid target rows required for the R² denominator.
    pub r2_min_observations: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self { window: 90, min_observations: 30, r2_lookback: 252, r2_min_observations: 10 }
    }
}

/// Per-date coefficients of a rolling regression.
///
/// Coefficient vectors hold the intercept at index 0 followed by one entry
/// per factor, in frame column order.
#[derive(Debug, Clone)]
pub struct RollingModel {
    horizon: Horizon,
    factor_names: Vec<FactorName>,
    coefficients: Vec<Option<Array1<f64>>>,
    r_squared: Vec<Option<f64>>,
    outcomes: Vec<FitOutcome>,
}

impl RollingModel {
    /// Assemble a model from per-date parts.
    ///
    /// # Errors
    /// Returns [`ModelError::DimensionMismatch`] when the per-date vectors
    /// differ in length or a coefficient vector does not have one entry per
    /// factor plus the intercept.
    pub fn new(
        horizon: Horizon,
        factor_names: Vec<FactorName>,
        coefficients: Vec<Option<Array1<f64>>>,
        r_squared: Vec<Option<f64>>,
        outcomes: Vec<FitOutcome>,
    ) -> Result<Self, ModelError> {
        let n = coefficients.len();
        if r_squared.len() != n || outcomes.len() != n {
            return Err(ModelError::DimensionMismatch(format!(
                "{n} coefficient rows, {} r-squared rows, {} outcomes",
                r_squared.len(),
                outcomes.len()
            )));
        }
        let width = factor_names.len() + 1;
        if let Some(bad) = coefficients.iter().flatten().find(|c| c.len() != width) {
            return Err(ModelError::DimensionMismatch(format!(
                "coefficient row of length {}, expected {width}",
                bad.len()
            )));
        }
        Ok(Self { horizon, factor_names, coefficients, r_squared, outcomes })
    }

    /// Horizon of the model.
    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Factor names in coefficient order (after the intercept).
    #[must_use]
    pub fn factor_names(&self) -> &[FactorName] {
        &self.factor_names
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Check if the model covers no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Full coefficient vector of date `i`, intercept first.
    #[must_use]
    pub fn coefficients(&self, i: usize) -> Option<&Array1<f64>> {
        self.coefficients.get(i)?.as_ref()
    }

    /// Factor coefficients of date `i`, without the intercept.
    #[must_use]
    pub fn factor_coefficients(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        self.coefficients(i).map(|c| c.slice(s![1..]))
    }

    /// Intercept of date `i`.
    #[must_use]
    pub fn intercept(&self, i: usize) -> Option<f64> {
        self.coefficients(i).map(|c| c[0])
    }

    /// Current-day R² of date `i`.
    #[must_use]
    pub fn r_squared(&self, i: usize) -> Option<f64> {
        self.r_squared.get(i).copied().flatten()
    }

    /// Outcome of date `i`.
    #[must_use]
    pub fn outcome(&self, i: usize) -> Option<&FitOutcome> {
        self.outcomes.get(i)
    }

    /// Outcomes of every date.
    #[must_use]
    pub fn outcomes(&self) -> &[FitOutcome] {
        &self.outcomes
    }

    /// Number of dates fitted on their own window.
    #[must_use]
    pub fn fitted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, FitOutcome::Fitted)).count()
    }

    /// Number of dates that fell back.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fallback()).count()
    }

    /// Coefficients of factor `j` over the last `count` dates up to and
    /// including `upto` that were fitted on their own window, oldest first.
    ///
    /// Restored fallback dates are skipped: they repeat the historical mean.
    #[must_use]
    pub fn coefficient_history(&self, j: usize, upto: usize, count: usize) -> Vec<f64> {
        if j >= self.factor_names.len() || self.coefficients.is_empty() {
            return Vec::new();
        }
        let end = upto.min(self.coefficients.len() - 1);
        let mut history: Vec<f64> = self.coefficients[..=end]
            .iter()
            .zip(&self.outcomes)
            .rev()
            .filter(|(_, outcome)| matches!(outcome, FitOutcome::Fitted))
            .filter_map(|(c, _)| c.as_ref())
            .take(count)
            .map(|c| c[j + 1])
            .collect();
        history.reverse();
        history
    }
}

/// Fits a regression on the trailing window of every date.
///
/// Dates before the first full window are [`FitOutcome::Warmup`]. A window
/// with too few complete rows, or whose fit fails, takes the column-wise mean
/// of every earlier date that carries coefficients; with no such date the
/// coefficients stay undefined.
#[derive(Debug, Clone, Default)]
pub struct RollingRegressor<E = OlsEstimator> {
    estimator: E,
    config: RegressionConfig,
}

impl RollingRegressor<OlsEstimator> {
    /// Create an OLS regressor with default windows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: WindowEstimator> RollingRegressor<E> {
    /// Create a regressor with a custom estimator and configuration.
    #[must_use]
    pub const fn with_estimator(estimator: E, config: RegressionConfig) -> Self {
        Self { estimator, config }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RegressionConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Get the estimator.
    #[must_use]
    pub const fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Fit every date of `frame`.
    ///
    /// Windows are fitted in parallel; fallbacks are then resolved in date
    /// order so each one only sees earlier dates.
    #[must_use]
    pub fn fit(&self, frame: &FactorFrame) -> RollingModel {
        let n = frame.n_rows();
        let k = frame.n_factors();
        let window = self.config.window;

        let fits: Vec<WindowFit> = (window.min(n)..n)
            .into_par_iter()
            .map(|i| -> WindowFit {
                let beta = self.fit_window(frame, i)?;
                let r2 = self.current_r_squared(frame, i, &beta);
                Ok((beta, r2))
            })
            .collect();

        let mut coefficients: Vec<Option<Array1<f64>>> = vec![None; n];
        let mut r_squared = vec![None; n];
        let mut outcomes = vec![FitOutcome::Warmup; n];

        let mut sum = Array1::<f64>::zeros(k + 1);
        let mut defined = 0usize;
        for (i, fit) in (window.min(n)..n).zip(fits) {
            match fit {
                Ok((beta, r2)) => {
                    coefficients[i] = Some(beta);
                    r_squared[i] = r2;
                    outcomes[i] = FitOutcome::Fitted;
                }
                Err(reason) => {
                    let restored = defined > 0;
                    if restored {
                        coefficients[i] = Some(&sum / defined as f64);
                    }
                    debug!(date = %frame.dates()[i], ?reason, restored, "regression fell back");
                    outcomes[i] = FitOutcome::Fallback { reason, restored };
                }
            }
            if let Some(beta) = &coefficients[i] {
                sum += beta;
                defined += 1;
            }
        }

        let model = RollingModel {
            horizon: frame.horizon(),
            factor_names: frame.factor_names().to_vec(),
            coefficients,
            r_squared,
            outcomes,
        };
        info!(
            horizon = %model.horizon,
            estimator = self.estimator.name(),
            rows = n,
            fitted = model.fitted_count(),
            fallbacks = model.fallback_count(),
            "rolling regression complete"
        );
        model
    }

    /// Fit the window `[i - window, i)` on its complete rows.
    fn fit_window(&self, frame: &FactorFrame, i: usize) -> Result<Array1<f64>, FallbackReason> {
        let target = frame.target();
        let k = frame.n_factors();
        let rows: Vec<usize> = (i - self.config.window..i)
            .filter(|&r| target[r].is_finite() && frame.row(r).iter().all(|v| v.is_finite()))
            .collect();

        if rows.len() < self.config.min_observations {
            return Err(FallbackReason::InsufficientData {
                valid: rows.len(),
                required: self.config.min_observations,
            });
        }

        let y: Array1<f64> = rows.iter().map(|&r| target[r]).collect();
        let mut x = Array2::<f64>::ones((rows.len(), k + 1));
        for (a, &r) in rows.iter().enumerate() {
            x.slice_mut(s![a, 1..]).assign(&frame.row(r));
        }

        let beta =
            self.estimator.fit(&y, &x).map_err(|e| FallbackReason::Numerical(e.to_string()))?;
        if beta.len() != k + 1 {
            return Err(FallbackReason::Numerical(format!(
                "estimator returned {} coefficients, expected {}",
                beta.len(),
                k + 1
            )));
        }
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(FallbackReason::Numerical(EstimatorError::NonFinite.to_string()));
        }
        Ok(beta)
    }

    /// R² of the prediction for date `i` itself.
    ///
    /// The denominator compares today's target with the mean target over
    /// `[i - r2_lookback, i)`; it is `0.0` when that history is too short
    /// or the squared deviation is zero.
    fn current_r_squared(&self, frame: &FactorFrame, i: usize, beta: &Array1<f64>) -> Option<f64> {
        let y = frame.target()[i];
        let x = frame.row(i);
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let predicted = beta[0] + beta.slice(s![1..]).dot(&x);
        let ss_res = (y - predicted).powi(2);

        let start = i.saturating_sub(self.config.r2_lookback);
        let history = frame.target().slice(s![start..i]);
        if valid_count(&history) < self.config.r2_min_observations {
            return Some(0.0);
        }
        let mean = nan_mean(&history)?;
        let ss_tot = (y - mean).powi(2);
        Some(if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 })
    }
}
