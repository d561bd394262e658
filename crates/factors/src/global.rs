//! Global dollar and commodity factors.

use copbrief_primitives::{COMMODITY_FACTOR, DOLLAR_FACTOR, Horizon, ReturnMatrix, Ticker};
use copbrief_traits::{ConfigurableFactor, Factor, FactorError, FactorKind};
use ndarray::{Array1, s};

/// Configuration for a global factor.
#[derive(Debug, Clone)]
pub struct GlobalFactorConfig {
    /// Factor column name.
    pub name: String,
    /// Source series.
    pub ticker: Ticker,
}

impl Default for GlobalFactorConfig {
    fn default() -> Self {
        Self { name: DOLLAR_FACTOR.to_string(), ticker: Ticker::new("DX-Y.NYB") }
    }
}

/// A single global series, lagged one row on horizons that lag global factors.
///
/// The first row of a lagged factor is missing.
#[derive(Debug, Clone, Default)]
pub struct LaggedGlobalFactor {
    config: GlobalFactorConfig,
}

impl LaggedGlobalFactor {
    /// Dollar index factor (`DXY_L1`) reading `ticker`.
    #[must_use]
    pub fn dollar(ticker: Ticker) -> Self {
        Self::with_config(GlobalFactorConfig { name: DOLLAR_FACTOR.to_string(), ticker })
    }

    /// Oil factor (`BZ_lag1`) reading `ticker`.
    #[must_use]
    pub fn commodity(ticker: Ticker) -> Self {
        Self::with_config(GlobalFactorConfig { name: COMMODITY_FACTOR.to_string(), ticker })
    }
}

/// Shift a series down by `lag` rows, filling the head with `NaN`.
#[must_use]
pub fn shift(series: &Array1<f64>, lag: usize) -> Array1<f64> {
    let n = series.len();
    let mut out = Array1::from_elem(n, f64::NAN);
    if lag < n {
        out.slice_mut(s![lag..]).assign(&series.slice(s![..n - lag]));
    }
    out
}

impl Factor for LaggedGlobalFactor {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Global
    }

    fn required_tickers(&self) -> Vec<&str> {
        vec![self.config.ticker.as_str()]
    }

    fn compute(&self, matrix: &ReturnMatrix, horizon: Horizon) -> Result<Array1<f64>, FactorError> {
        let column = matrix
            .column(self.config.ticker.as_str())
            .ok_or_else(|| FactorError::MissingTicker(self.config.ticker.to_string()))?
            .to_owned();
        Ok(if horizon.lags_global_factors() { shift(&column, 1) } else { column })
    }
}

impl ConfigurableFactor for LaggedGlobalFactor {
    type Config = GlobalFactorConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use copbrief_primitives::Date;
    use ndarray::{Array2, array};

    use super::*;

    fn matrix() -> ReturnMatrix {
        let start = Date::from_ymd_opt(2024, 6, 3).unwrap();
        ReturnMatrix::new(
            start.iter_days().take(3).collect(),
            vec![Ticker::new("BZ=F"), Ticker::new("DX-Y.NYB")],
            Array2::from_shape_vec((3, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]).unwrap(),
        )
    }

    #[test]
    fn lagged_on_one_day_horizon() {
        let out = LaggedGlobalFactor::dollar(Ticker::new("DX-Y.NYB"))
            .compute(&matrix(), Horizon::OneDay)
            .unwrap();
        assert!(out[0].is_nan());
        assert_eq!(out.slice(s![1..]), array![10.0, 20.0]);
    }

    #[test]
    fn unlagged_on_five_day_horizon() {
        let factor = LaggedGlobalFactor::commodity(Ticker::new("BZ=F"));
        assert_eq!(factor.name(), COMMODITY_FACTOR);
        let out = factor.compute(&matrix(), Horizon::FiveDay).unwrap();
        assert_eq!(out, array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_ticker_is_an_error() {
        let factor = LaggedGlobalFactor::dollar(Ticker::new("DXY"));
        let err = factor.compute(&matrix(), Horizon::OneDay).unwrap_err();
        assert!(matches!(err, FactorError::MissingTicker(t) if t == "DXY"));
    }

    #[test]
    fn shift_longer_than_series() {
        let out = shift(&array![1.0, 2.0], 3);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn default_is_dollar_factor() {
        let factor = LaggedGlobalFactor::default();
        assert_eq!(factor.name(), DOLLAR_FACTOR);
        assert_eq!(factor.kind(), FactorKind::Global);
        assert_eq!(factor.config().ticker, Ticker::new("DX-Y.NYB"));
    }
}
