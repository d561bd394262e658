//! Local-risk proxy selection and the local-risk factor.

use copbrief_math::{pearson_correlation, sample_std};
use copbrief_primitives::{Horizon, LOCAL_FACTOR, ReturnMatrix, Ticker};
use copbrief_traits::{ConfigurableFactor, Factor, FactorError, FactorKind};
use ndarray::{Array1, ArrayView1, s};
use tracing::debug;

/// Configuration for the local-risk selector.
#[derive(Debug, Clone)]
pub struct LocalRiskConfig {
    /// Candidate proxies, in priority order. Earlier candidates win ties.
    pub candidates: Vec<Ticker>,
    /// Proxy used when no candidate is present.
    pub default: Ticker,
    /// Rolling correlation window in rows.
    pub window: usize,
    /// Added to the correlation volatility before inverting.
    pub epsilon: f64,
}

impl Default for LocalRiskConfig {
    fn default() -> Self {
        Self {
            candidates: vec![Ticker::new("GXG"), Ticker::new("ICOL")],
            default: Ticker::new("GXG"),
            window: 90,
            epsilon: 1e-6,
        }
    }
}

/// Outcome of the local-risk selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRiskChoice {
    /// Selected proxy.
    pub ticker: Ticker,
    /// Stability of every present candidate, in candidate order.
    pub stabilities: Vec<(Ticker, f64)>,
    /// Whether no candidate was present and the default was used.
    pub defaulted: bool,
}

/// Chooses the local-market proxy whose correlation with the target is most stable.
#[derive(Debug, Clone, Default)]
pub struct LocalRiskSelector {
    config: LocalRiskConfig,
}

impl LocalRiskSelector {
    /// Create a selector with the given configuration.
    #[must_use]
    pub const fn with_config(config: LocalRiskConfig) -> Self {
        Self { config }
    }

    /// Returns the selector's configuration.
    #[must_use]
    pub const fn config(&self) -> &LocalRiskConfig {
        &self.config
    }

    /// Select a proxy from the standardized 5-day matrix.
    ///
    /// Candidates are scanned in configured order and a later candidate
    /// replaces the current best only with strictly higher stability.
    #[must_use]
    pub fn select(&self, matrix: &ReturnMatrix, target: &str) -> LocalRiskChoice {
        let target_col = matrix.column(target);
        let stabilities: Vec<(Ticker, f64)> = self
            .config
            .candidates
            .iter()
            .filter_map(|candidate| {
                let column = matrix.column(candidate.as_str())?;
                let stability = target_col.as_ref().map_or(0.0, |t| {
                    correlation_stability(&column, t, self.config.window, self.config.epsilon)
                });
                Some((candidate.clone(), stability))
            })
            .collect();

        let mut best: Option<usize> = None;
        for (k, (_, stability)) in stabilities.iter().enumerate() {
            if best.is_none_or(|b| *stability > stabilities[b].1) {
                best = Some(k);
            }
        }

        let choice = match best {
            Some(k) => {
                LocalRiskChoice { ticker: stabilities[k].0.clone(), stabilities, defaulted: false }
            }
            None => LocalRiskChoice {
                ticker: self.config.default.clone(),
                stabilities: Vec::new(),
                defaulted: true,
            },
        };
        debug!(
            ticker = %choice.ticker,
            defaulted = choice.defaulted,
            candidates = choice.stabilities.len(),
            "selected local risk proxy"
        );
        choice
    }
}

/// Inverse volatility of the rolling correlation between `x` and `y`.
///
/// Correlations are taken over full `window`-row windows ending at each row;
/// windows where the correlation is undefined are skipped. Returns `0.0`
/// when fewer than two correlations are available.
#[must_use]
pub fn correlation_stability(
    x: &ArrayView1<'_, f64>,
    y: &ArrayView1<'_, f64>,
    window: usize,
    epsilon: f64,
) -> f64 {
    let n = x.len().min(y.len());
    if window == 0 || n < window {
        return 0.0;
    }

    let correlations: Vec<f64> = (window - 1..n)
        .filter_map(|end| {
            let range = s![end + 1 - window..=end];
            pearson_correlation(&x.slice(range), &y.slice(range))
        })
        .collect();

    sample_std(&correlations).map_or(0.0, |std| 1.0 / (std + epsilon))
}

/// Configuration for the local-risk factor.
#[derive(Debug, Clone)]
pub struct LocalFactorConfig {
    /// Selected local-market proxy.
    pub ticker: Ticker,
}

impl Default for LocalFactorConfig {
    fn default() -> Self {
        Self { ticker: Ticker::new("GXG") }
    }
}

/// The local-risk factor: the selected proxy's standardized return.
///
/// Only part of the 5-day model; on other horizons the factor is zero.
#[derive(Debug, Clone)]
pub struct LocalRiskFactor {
    config: LocalFactorConfig,
}

impl LocalRiskFactor {
    /// Create a local-risk factor reading `ticker`.
    #[must_use]
    pub const fn new(ticker: Ticker) -> Self {
        Self { config: LocalFactorConfig { ticker } }
    }
}

impl Factor for LocalRiskFactor {
    fn name(&self) -> &str {
        LOCAL_FACTOR
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Local
    }

    fn required_tickers(&self) -> Vec<&str> {
        vec![self.config.ticker.as_str()]
    }

    fn applies_to(&self, horizon: Horizon) -> bool {
        horizon.includes_local_factor()
    }

    fn compute(&self, matrix: &ReturnMatrix, horizon: Horizon) -> Result<Array1<f64>, FactorError> {
        if !self.applies_to(horizon) {
            return Ok(Array1::zeros(matrix.n_rows()));
        }
        Ok(matrix
            .column(self.config.ticker.as_str())
            .map_or_else(|| Array1::zeros(matrix.n_rows()), |c| c.to_owned()))
    }
}

impl ConfigurableFactor for LocalRiskFactor {
    type Config = LocalFactorConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
