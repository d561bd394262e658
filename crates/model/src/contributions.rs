//! Capped factor contributions.

use copbrief_factors::FactorFrame;
use copbrief_primitives::{FactorName, Horizon};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use crate::{ModelError, RollingModel};

/// Per-date factor contributions and residual of one horizon.
///
/// For every date `sum(capped) + residual == target`. Dates without
/// coefficients carry zero contributions and a zero residual.
#[derive(Debug, Clone)]
pub struct ContributionFrame {
    horizon: Horizon,
    factor_names: Vec<FactorName>,
    raw: Array2<f64>,
    capped: Array2<f64>,
    residual: Array1<f64>,
}

impl ContributionFrame {
    /// Horizon of the frame.
    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Factor names in column order.
    #[must_use]
    pub fn factor_names(&self) -> &[FactorName] {
        &self.factor_names
    }

    /// Number of dates.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.residual.len()
    }

    /// Uncapped contributions (dates x factors).
    #[must_use]
    pub const fn raw(&self) -> &Array2<f64> {
        &self.raw
    }

    /// Capped contributions (dates x factors).
    #[must_use]
    pub const fn capped(&self) -> &Array2<f64> {
        &self.capped
    }

    /// Residual per date.
    #[must_use]
    pub const fn residual(&self) -> &Array1<f64> {
        &self.residual
    }

    /// Capped contributions of date `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.capped.row(i)
    }

    /// Sum of the capped contributions of date `i`.
    #[must_use]
    pub fn explained(&self, i: usize) -> f64 {
        self.capped.row(i).sum()
    }
}

/// Multiplies factor values by the date's coefficients and caps the result.
///
/// Each contribution is clamped to `cap_ratio * |target|`; whatever the cap
/// removes ends up in the residual. The intercept is never a contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionCalculator {
    cap_ratio: f64,
}

impl Default for ContributionCalculator {
    fn default() -> Self {
        Self { cap_ratio: 0.8 }
    }
}

impl ContributionCalculator {
    /// Create a calculator with the given cap ratio.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfig`] unless `0 <= cap_ratio <= 1`.
    pub fn try_new(cap_ratio: f64) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&cap_ratio) {
            return Err(ModelError::InvalidConfig(format!(
                "cap_ratio must lie in [0, 1], got {cap_ratio}"
            )));
        }
        Ok(Self { cap_ratio })
    }

    /// Largest contribution as a share of the absolute target move.
    #[must_use]
    pub const fn cap_ratio(&self) -> f64 {
        self.cap_ratio
    }

    /// Compute contributions of every date of `frame` under `model`.
    ///
    /// # Errors
    /// Returns [`ModelError::DimensionMismatch`] when the model does not
    /// cover the frame's dates and factors.
    pub fn compute(
        &self,
        frame: &FactorFrame,
        model: &RollingModel,
    ) -> Result<ContributionFrame, ModelError> {
        let n = frame.n_rows();
        let k = frame.n_factors();
        if model.len() != n || model.factor_names().len() != k {
            return Err(ModelError::DimensionMismatch(format!(
                "model covers {} dates and {} factors, frame has {n} and {k}",
                model.len(),
                model.factor_names().len()
            )));
        }

        let mut raw = Array2::zeros((n, k));
        let mut capped = Array2::zeros((n, k));
        let mut residual = Array1::zeros(n);
        let mut capped_cells = 0usize;

        for i in 0..n {
            let target = frame.target()[i];
            let Some(beta) = model.factor_coefficients(i) else { continue };
            if !target.is_finite() {
                continue;
            }
            let cap = self.cap_ratio * target.abs();
            let values = frame.row(i);
            for j in 0..k {
                let contribution = beta[j] * values[j];
                let contribution = if contribution.is_finite() { contribution } else { 0.0 };
                let bounded = contribution.clamp(-cap, cap);
                if bounded != contribution {
                    capped_cells += 1;
                }
                raw[[i, j]] = contribution;
                capped[[i, j]] = bounded;
            }
            residual[i] = target - capped.row(i).sum();
        }

        debug!(horizon = %frame.horizon(), rows = n, capped_cells, "computed contributions");
        Ok(ContributionFrame {
            horizon: frame.horizon(),
            factor_names: frame.factor_names().to_vec(),
            raw,
            capped,
            residual,
        })
    }
}
