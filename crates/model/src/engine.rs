//! End-to-end relations pipeline.

use copbrief_factors::{
    FactorFrame, FactorFrameBuilder, LaggedGlobalFactor, LocalRiskChoice, LocalRiskFactor,
    LocalRiskSelector, RegionalFxFactor, returns_for_horizon,
};
use copbrief_primitives::{Horizon, ReturnMatrix};
use copbrief_traits::{ConfigurableFactor, TimeSeriesTransform, WindowEstimator};
use copbrief_utils::PanelBuilder;
use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::{
    ContributionCalculator, ContributionFrame, ModelError, OlsEstimator, RegressionConfig,
    RelationsConfig, ResultTable, RollingModel, RollingRegressor, SummaryConfig, TableConfig,
    build_summary, is_risk_on,
};

/// Everything computed for one horizon.
#[derive(Debug, Clone)]
pub struct HorizonRelations {
    frame: FactorFrame,
    model: RollingModel,
    contributions: ContributionFrame,
    table: ResultTable,
}

impl HorizonRelations {
    /// Horizon of these relations.
    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        self.table.horizon
    }

    /// Standardized target and factors.
    #[must_use]
    pub const fn frame(&self) -> &FactorFrame {
        &self.frame
    }

    /// Rolling coefficients.
    #[must_use]
    pub const fn model(&self) -> &RollingModel {
        &self.model
    }

    /// Per-date contributions.
    #[must_use]
    pub const fn contributions(&self) -> &ContributionFrame {
        &self.contributions
    }

    /// Latest-day table.
    #[must_use]
    pub const fn table(&self) -> &ResultTable {
        &self.table
    }
}

/// Output of a relations run.
#[derive(Debug, Clone)]
pub struct RelationsReport {
    one_day: HorizonRelations,
    five_day: HorizonRelations,
    local: LocalRiskChoice,
    risk_on: bool,
    summary: String,
}

impl RelationsReport {
    /// 1-day relations.
    #[must_use]
    pub const fn one_day(&self) -> &HorizonRelations {
        &self.one_day
    }

    /// 5-day relations.
    #[must_use]
    pub const fn five_day(&self) -> &HorizonRelations {
        &self.five_day
    }

    /// Relations of `horizon`.
    #[must_use]
    pub const fn horizon(&self, horizon: Horizon) -> &HorizonRelations {
        match horizon {
            Horizon::OneDay => &self.one_day,
            Horizon::FiveDay => &self.five_day,
        }
    }

    /// Both latest-day tables, 1-day first.
    #[must_use]
    pub const fn tables(&self) -> [&ResultTable; 2] {
        [&self.one_day.table, &self.five_day.table]
    }

    /// Selected local-risk proxy.
    #[must_use]
    pub const fn local_risk(&self) -> &LocalRiskChoice {
        &self.local
    }

    /// Whether the risk-aversion proxy is above its trailing quantile.
    #[must_use]
    pub const fn risk_on(&self) -> bool {
        self.risk_on
    }

    /// One or two line summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }
}

/// Runs the relations pipeline on a long price panel.
///
/// Stages: panel, horizon returns, rolling z-scores, local-risk selection,
/// factor frames, rolling regression, contributions, tables and summary.
#[derive(Debug, Clone, Default)]
pub struct RelationsEngine<E = OlsEstimator> {
    config: RelationsConfig,
    estimator: E,
}

impl RelationsEngine<OlsEstimator> {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration.
    #[must_use]
    pub fn with_config(config: RelationsConfig) -> Self {
        Self { config, estimator: OlsEstimator }
    }
}

impl<E: WindowEstimator + Clone> RelationsEngine<E> {
    /// Replace the window estimator.
    #[must_use]
    pub fn with_estimator<F: WindowEstimator + Clone>(self, estimator: F) -> RelationsEngine<F> {
        RelationsEngine { config: self.config, estimator }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RelationsConfig {
        &self.config
    }

    /// Run the pipeline on a long `(date, ticker, pct_change)` frame.
    ///
    /// # Errors
    /// Returns [`ModelError::MissingTicker`] when the target, dollar index or
    /// commodity series is absent, and panel errors for malformed input
    /// such as duplicated `(date, ticker)` keys.
    pub fn run(&self, long: &DataFrame) -> Result<RelationsReport, ModelError> {
        self.config.validate()?;
        let panel = PanelBuilder::new().with_ffill_limit(self.config.ffill_limit).build(long)?;
        self.run_panel(&panel)
    }

    /// Run the pipeline on an already pivoted return panel.
    ///
    /// # Errors
    /// See [`RelationsEngine::run`].
    pub fn run_panel(&self, panel: &ReturnMatrix) -> Result<RelationsReport, ModelError> {
        let config = &self.config;
        for ticker in [&config.target, &config.dollar_index, &config.commodity] {
            if !panel.contains(ticker.as_str()) {
                return Err(ModelError::MissingTicker(ticker.to_string()));
            }
        }
        for ticker in config.tickers() {
            if !panel.contains(ticker.as_str()) {
                warn!(%ticker, "optional series missing from panel");
            }
        }
        info!(rows = panel.n_rows(), tickers = panel.n_cols(), "relations panel ready");

        let compounding = config.compounding()?;
        let zscore = config.zscore()?;
        let standardized = |horizon| {
            zscore.apply_matrix(&returns_for_horizon(panel, horizon, &compounding))
        };
        let one_day = standardized(Horizon::OneDay);
        let five_day = standardized(Horizon::FiveDay);

        let local = LocalRiskSelector::with_config(config.local_risk())
            .select(&five_day, config.target.as_str());
        info!(
            ticker = %local.ticker,
            defaulted = local.defaulted,
            "local risk proxy selected"
        );

        let builder = FactorFrameBuilder::new(config.target.clone())
            .with_risk_proxy(config.risk_proxy.clone())
            .with_factor(LaggedGlobalFactor::dollar(config.dollar_index.clone()))
            .with_factor(RegionalFxFactor::with_config(config.regional()))
            .with_factor(LaggedGlobalFactor::commodity(config.commodity.clone()))
            .with_factor(LocalRiskFactor::new(local.ticker.clone()));

        let one_day = self.relations(builder.build(&one_day, Horizon::OneDay)?)?;
        let five_day = self.relations(builder.build(&five_day, Horizon::FiveDay)?)?;

        let risk_on =
            is_risk_on(five_day.frame.risk_proxy(), config.risk_lookback, config.risk_quantile);
        let summary = build_summary(
            &one_day.table,
            &five_day.table,
            risk_on,
            &SummaryConfig {
                driver_threshold: config.driver_threshold,
                r2_threshold: config.r2_threshold,
                residual_share: config.residual_share,
            },
        );
        info!(risk_on, "relations summary built");

        Ok(RelationsReport { one_day, five_day, local, risk_on, summary })
    }

    /// Regress, attribute and tabulate one horizon.
    fn relations(&self, frame: FactorFrame) -> Result<HorizonRelations, ModelError> {
        let config = &self.config;
        let regressor = RollingRegressor::with_estimator(
            self.estimator.clone(),
            RegressionConfig {
                window: config.regression_window,
                min_observations: config.regression_min_observations,
                r2_lookback: config.r2_lookback,
                r2_min_observations: config.r2_min_observations,
            },
        );
        let model = regressor.fit(&frame);
        let contributions = ContributionCalculator::try_new(config.cap_ratio)?.compute(&frame, &model)?;
        let table = ResultTable::build(
            &frame,
            &model,
            &contributions,
            &TableConfig {
                correlation_window: config.correlation_window,
                correlation_weight: config.correlation_weight,
                stability_weight: config.stability_weight,
                stability_window: config.stability_window,
                stability_epsilon: config.stability_epsilon,
                capped_epsilon: config.capped_epsilon,
            },
        )?;
        Ok(HorizonRelations { frame, model, contributions, table })
    }
}
