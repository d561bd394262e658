//! Regional FX factor.

use copbrief_primitives::{Horizon, REGIONAL_FACTOR, ReturnMatrix, Ticker};
use copbrief_traits::{ConfigurableFactor, Factor, FactorError, FactorKind};
use ndarray::Array1;
use tracing::debug;

/// Configuration for the regional FX factor.
#[derive(Debug, Clone)]
pub struct RegionalConfig {
    /// Regional currency pairs averaged into the factor.
    pub tickers: Vec<Ticker>,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self { tickers: vec![Ticker::new("USDMXN=X"), Ticker::new("USDCLP=X")] }
    }
}

/// Row-wise mean of the available regional FX series.
///
/// Pairs absent from the matrix are ignored; with none available the factor
/// is zero.
#[derive(Debug, Clone, Default)]
pub struct RegionalFxFactor {
    config: RegionalConfig,
}

impl RegionalFxFactor {
    /// Create a regional factor with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factor for RegionalFxFactor {
    fn name(&self) -> &str {
        REGIONAL_FACTOR
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Regional
    }

    fn required_tickers(&self) -> Vec<&str> {
        self.config.tickers.iter().map(Ticker::as_str).collect()
    }

    fn compute(&self, matrix: &ReturnMatrix, _horizon: Horizon) -> Result<Array1<f64>, FactorError> {
        let available: Vec<_> =
            self.config.tickers.iter().filter_map(|t| matrix.column(t.as_str())).collect();

        if available.is_empty() {
            debug!("no regional fx series available, factor set to zero");
            return Ok(Array1::zeros(matrix.n_rows()));
        }

        let mut out = Array1::from_elem(matrix.n_rows(), f64::NAN);
        for (i, value) in out.iter_mut().enumerate() {
            let (sum, count) = available
                .iter()
                .map(|c| c[i])
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if count > 0 {
                *value = sum / count as f64;
            }
        }
        Ok(out)
    }
}

impl ConfigurableFactor for RegionalFxFactor {
    type Config = RegionalConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
