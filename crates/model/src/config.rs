//! Relations engine configuration.

use copbrief_factors::{CompoundReturns, LocalRiskConfig, RegionalConfig, RollingZScore};
use copbrief_primitives::Ticker;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Every ticker, window and threshold of the relations engine.
///
/// Deserializes from a partial table; absent keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    /// Series being explained.
    pub target: Ticker,
    /// Global dollar index.
    pub dollar_index: Ticker,
    /// Commodity (oil) benchmark.
    pub commodity: Ticker,
    /// Regional currency pairs averaged into the regional factor.
    pub regional_fx: Vec<Ticker>,
    /// Local-market proxies, in priority order. Earlier entries win ties.
    pub local_candidates: Vec<Ticker>,
    /// Local proxy used when no candidate is present.
    pub default_local: Ticker,
    /// Global risk-aversion proxy.
    pub risk_proxy: Ticker,

    /// Longest run of missing rows filled forward in the panel.
    pub ffill_limit: usize,
    /// Rows compounded into the 5-day return.
    pub compound_window: usize,
    /// Observations required for a defined 5-day return.
    pub compound_min_periods: usize,
    /// Rows in the z-score window.
    pub zscore_window: usize,
    /// Observations required for a non-neutral z-score.
    pub zscore_min_periods: usize,
    /// Rows in the local-risk correlation window.
    pub local_window: usize,

    /// Rows in each regression window.
    pub regression_window: usize,
    /// Valid rows required to attempt a fit.
    pub regression_min_observations: usize,
    /// Rows of target history behind the R² denominator.
    pub r2_lookback: usize,
    /// Valid target rows required for the R² denominator.
    pub r2_min_observations: usize,

    /// Largest contribution as a share of the absolute target move.
    pub cap_ratio: f64,
    /// Raw contributions at or below this size are never flagged as capped.
    pub capped_epsilon: f64,
    /// Rows in the result-table correlation.
    pub correlation_window: usize,
    /// Weight of the absolute correlation in the composite score.
    pub correlation_weight: f64,
    /// Weight of the normalized coefficient stability in the composite score.
    pub stability_weight: f64,
    /// Dates of coefficient history behind the stability measure.
    pub stability_window: usize,
    /// Added to volatilities before inverting them.
    pub stability_epsilon: f64,

    /// Contributions at or below this size are not named as drivers.
    pub driver_threshold: f64,
    /// 1-day R² below which the summary hedges its wording.
    pub r2_threshold: f64,
    /// Residual share of the move above which the summary calls out noise.
    pub residual_share: f64,
    /// Quantile of the risk proxy marking a risk-averse day.
    pub risk_quantile: f64,
    /// Rows of risk-proxy history behind the quantile.
    pub risk_lookback: usize,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            target: Ticker::new("COP=X"),
            dollar_index: Ticker::new("DX-Y.NYB"),
            commodity: Ticker::new("BZ=F"),
            regional_fx: vec![Ticker::new("USDMXN=X"), Ticker::new("USDCLP=X")],
            local_candidates: vec![Ticker::new("GXG"), Ticker::new("ICOL")],
            default_local: Ticker::new("GXG"),
            risk_proxy: Ticker::new("^VIX"),
            ffill_limit: 5,
            compound_window: 5,
            compound_min_periods: 3,
            zscore_window: 90,
            zscore_min_periods: 10,
            local_window: 90,
            regression_window: 90,
            regression_min_observations: 30,
            r2_lookback: 252,
            r2_min_observations: 10,
            cap_ratio: 0.8,
            capped_epsilon: 0.001,
            correlation_window: 5,
            correlation_weight: 0.6,
            stability_weight: 0.4,
            stability_window: 90,
            stability_epsilon: 1e-6,
            driver_threshold: 0.001,
            r2_threshold: 0.10,
            residual_share: 0.30,
            risk_quantile: 0.8,
            risk_lookback: 252,
        }
    }
}

impl RelationsConfig {
    /// Every ticker the engine reads, target first.
    #[must_use]
    pub fn tickers(&self) -> Vec<Ticker> {
        let mut out = vec![self.target.clone(), self.dollar_index.clone(), self.commodity.clone()];
        out.extend(self.regional_fx.iter().cloned());
        out.extend(self.local_candidates.iter().cloned());
        out.push(self.risk_proxy.clone());
        let mut seen = std::collections::HashSet::new();
        out.retain(|t| seen.insert(t.clone()));
        out
    }

    /// Check windows and ratios for consistency.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfig`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidConfig(msg));

        if self.regression_window == 0 {
            return invalid("regression_window must be positive".to_string());
        }
        if self.regression_min_observations > self.regression_window {
            return invalid(format!(
                "regression_min_observations {} exceeds regression_window {}",
                self.regression_min_observations, self.regression_window
            ));
        }
        if !(0.0..=1.0).contains(&self.cap_ratio) {
            return invalid(format!("cap_ratio must lie in [0, 1], got {}", self.cap_ratio));
        }
        if !(0.0..=1.0).contains(&self.risk_quantile) {
            return invalid(format!("risk_quantile must lie in [0, 1], got {}", self.risk_quantile));
        }
        if self.correlation_window < 2 {
            return invalid("correlation_window must be at least 2".to_string());
        }
        if self.local_window < 2 {
            return invalid("local_window must be at least 2".to_string());
        }
        self.compounding()?;
        self.zscore()?;
        Ok(())
    }

    /// 5-day compounding transform.
    ///
    /// # Errors
    /// Returns [`ModelError::Transform`] for an inconsistent window.
    pub fn compounding(&self) -> Result<CompoundReturns, ModelError> {
        Ok(CompoundReturns::try_new(self.compound_window, self.compound_min_periods)?)
    }

    /// Rolling z-score transform.
    ///
    /// # Errors
    /// Returns [`ModelError::Transform`] for an inconsistent window.
    pub fn zscore(&self) -> Result<RollingZScore, ModelError> {
        Ok(RollingZScore::try_new(self.zscore_window, self.zscore_min_periods)?)
    }

    /// Local-risk selector settings.
    #[must_use]
    pub fn local_risk(&self) -> LocalRiskConfig {
        LocalRiskConfig {
            candidates: self.local_candidates.clone(),
            default: self.default_local.clone(),
            window: self.local_window,
            epsilon: self.stability_epsilon,
        }
    }

    /// Regional factor settings.
    #[must_use]
    pub fn regional(&self) -> RegionalConfig {
        RegionalConfig { tickers: self.regional_fx.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RelationsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tickers().len(), 8);
        assert_eq!(config.tickers()[0], Ticker::new("COP=X"));
    }

    #[test]
    fn tickers_are_deduplicated() {
        let config = RelationsConfig {
            default_local: Ticker::new("ICOL"),
            local_candidates: vec![Ticker::new("ICOL"), Ticker::new("ICOL")],
            ..RelationsConfig::default()
        };
        let tickers = config.tickers();
        assert_eq!(tickers.iter().filter(|t| t.as_str() == "ICOL").count(), 1);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config =
            RelationsConfig { regression_min_observations: 120, ..RelationsConfig::default() };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));

        let config = RelationsConfig { cap_ratio: 1.5, ..RelationsConfig::default() };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));

        let config = RelationsConfig { zscore_min_periods: 1, ..RelationsConfig::default() };
        assert!(matches!(config.validate(), Err(ModelError::Transform(_))));
    }

    #[test]
    fn derived_settings_follow_config() {
        let config = RelationsConfig { local_window: 60, ..RelationsConfig::default() };
        assert_eq!(config.local_risk().window, 60);
        assert_eq!(config.local_risk().candidates[1], Ticker::new("ICOL"));
        assert_eq!(config.regional().tickers.len(), 2);
        assert_eq!(config.zscore().unwrap().min_periods(), 10);
    }
}
