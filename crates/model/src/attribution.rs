//! Latest-day attribution tables.
//!
//! A [`ResultTable`] describes the most recent date of one horizon: one row
//! per factor plus a residual row.

use copbrief_factors::FactorFrame;
use copbrief_math::{min_max_normalize, pearson_correlation, sample_std};
use copbrief_primitives::{Date, Horizon, RESIDUAL};
use ndarray::{Array1, s};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{ContributionFrame, ModelError, RollingModel};

/// One factor, or the residual, on the latest date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Factor name, or `residual`.
    pub factor: String,
    /// Standardized factor value.
    pub value: Option<f64>,
    /// Rolling coefficient.
    pub coefficient: Option<f64>,
    /// Capped contribution, or the residual itself.
    pub contribution: f64,
    /// Correlation with the target over the last few rows.
    pub corr_5d: Option<f64>,
    /// Composite relevance score.
    pub score: Option<f64>,
    /// Whether the contribution was materially reduced by the cap.
    pub capped: bool,
}

impl ResultRow {
    /// Check if this is the residual row.
    #[must_use]
    pub fn is_residual(&self) -> bool {
        self.factor == RESIDUAL
    }
}

/// Settings for scoring and flagging result rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Rows in the trailing correlation.
    pub correlation_window: usize,
    /// Weight of the absolute correlation.
    pub correlation_weight: f64,
    /// Weight of the normalized stability.
    pub stability_weight: f64,
    /// Dates of coefficient history behind the stability.
    pub stability_window: usize,
    /// Added to the coefficient volatility before inverting.
    pub stability_epsilon: f64,
    /// Raw contributions at or below this size are never flagged.
    pub capped_epsilon: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            correlation_window: 5,
            correlation_weight: 0.6,
            stability_weight: 0.4,
            stability_window: 90,
            stability_epsilon: 1e-6,
            capped_epsilon: 0.001,
        }
    }
}

/// Latest-day table of one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Horizon of the table.
    pub horizon: Horizon,
    /// Date described, `None` for an empty frame.
    pub date: Option<Date>,
    /// Standardized target on that date.
    pub target: Option<f64>,
    /// Current-day R² on that date.
    pub r_squared: Option<f64>,
    /// Factor rows in frame order, then the residual row.
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// An empty table for `horizon`.
    #[must_use]
    pub const fn empty(horizon: Horizon) -> Self {
        Self { horizon, date: None, target: None, r_squared: None, rows: Vec::new() }
    }

    /// Build the table of the last date of `frame`.
    ///
    /// # Errors
    /// Returns [`ModelError::DimensionMismatch`] when the parts do not cover
    /// the same dates.
    pub fn build(
        frame: &FactorFrame,
        model: &RollingModel,
        contributions: &ContributionFrame,
        config: &TableConfig,
    ) -> Result<Self, ModelError> {
        let n = frame.n_rows();
        if model.len() != n || contributions.n_rows() != n {
            return Err(ModelError::DimensionMismatch(format!(
                "frame has {n} dates, model {}, contributions {}",
                model.len(),
                contributions.n_rows()
            )));
        }
        if n == 0 {
            return Ok(Self::empty(frame.horizon()));
        }

        let last = n - 1;
        let k = frame.n_factors();
        let coefficients = model.factor_coefficients(last);
        let target = frame.target();
        let start = n.saturating_sub(config.correlation_window);

        let stabilities: Array1<f64> = (0..k)
            .map(|j| {
                let history = model.coefficient_history(j, last, config.stability_window);
                sample_std(&history).map_or(0.0, |std| 1.0 / (std + config.stability_epsilon))
            })
            .collect();
        let normalized = min_max_normalize(&stabilities);

        let mut rows = Vec::with_capacity(k + 1);
        for (j, name) in frame.factor_names().iter().enumerate() {
            let series = frame.values().column(j);
            let corr = pearson_correlation(
                &series.slice(s![start..]),
                &target.slice(s![start..]),
            )
            .unwrap_or(0.0);
            let raw = contributions.raw()[[last, j]];
            let capped = contributions.capped()[[last, j]];
            let value = series[last];
            rows.push(ResultRow {
                factor: name.to_string(),
                value: value.is_finite().then_some(value),
                coefficient: coefficients.map(|c| c[j]),
                contribution: capped,
                corr_5d: Some(corr),
                score: Some(
                    config.correlation_weight * corr.abs()
                        + config.stability_weight * normalized[j],
                ),
                capped: capped.abs() < raw.abs() && raw.abs() > config.capped_epsilon,
            });
        }
        rows.push(ResultRow {
            factor: RESIDUAL.to_string(),
            value: None,
            coefficient: None,
            contribution: contributions.residual()[last],
            corr_5d: None,
            score: None,
            capped: false,
        });

        Ok(Self {
            horizon: frame.horizon(),
            date: frame.dates().last().copied(),
            target: target[last].is_finite().then_some(target[last]),
            r_squared: model.r_squared(last),
            rows,
        })
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Factor rows, without the residual.
    pub fn factor_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| !r.is_residual())
    }

    /// Row of `factor`.
    #[must_use]
    pub fn row(&self, factor: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.factor == factor)
    }

    /// The residual contribution.
    #[must_use]
    pub fn residual(&self) -> Option<f64> {
        self.rows.iter().find(|r| r.is_residual()).map(|r| r.contribution)
    }

    /// Convert to a DataFrame with one row per table row.
    ///
    /// # Errors
    /// Returns [`ModelError::Polars`] if the frame cannot be assembled.
    pub fn to_dataframe(&self) -> Result<DataFrame, ModelError> {
        let col_f64 = |name: &str, f: fn(&ResultRow) -> Option<f64>| {
            Column::new(name.into(), self.rows.iter().map(f).collect::<Vec<_>>())
        };
        let df = DataFrame::new(vec![
            Column::new(
                "factor".into(),
                self.rows.iter().map(|r| r.factor.as_str()).collect::<Vec<_>>(),
            ),
            col_f64("value", |r| r.value),
            col_f64("coef", |r| r.coefficient),
            col_f64("contribution", |r| Some(r.contribution)),
            col_f64("corr_5d", |r| r.corr_5d),
            col_f64("score", |r| r.score),
            Column::new(
                "capped".into(),
                self.rows.iter().map(|r| if r.capped { "yes" } else { "" }).collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }

    /// Print a concise summary of the table.
    pub fn print_summary(&self) {
        println!(
            "\n================================================================================"
        );
        println!("USD/COP FACTOR RELATIONS: {}", self.horizon);
        println!(
            "================================================================================"
        );
        match self.date {
            Some(date) => println!("Date: {date}"),
            None => {
                println!("No data.");
                return;
            }
        }
        if let Some(target) = self.target {
            println!("Target (standardized): {target:>+8.3}");
        }
        println!(
            "--------------------------------------------------------------------------------"
        );
        println!(
            "{:<12} {:>10} {:>10} {:>14} {:>10} {:>8} {:>7}",
            "Factor", "Value", "Coef", "Contribution", "Corr 5d", "Score", "Capped"
        );
        println!("{:-<12} {:-^10} {:-^10} {:-^14} {:-^10} {:-^8} {:-^7}", "", "", "", "", "", "", "");

        let fmt = |v: Option<f64>, width: usize| match v {
            Some(v) => format!("{v:>width$.3}"),
            None => format!("{:>width$}", "-"),
        };
        for row in &self.rows {
            println!(
                "{:<12} {} {} {:>14.3} {} {} {:>7}",
                row.factor,
                fmt(row.value, 10),
                fmt(row.coefficient, 10),
                row.contribution,
                fmt(row.corr_5d, 10),
                fmt(row.score, 8),
                if row.capped { "yes" } else { "" }
            );
        }

        println!(
            "\n--------------------------------------------------------------------------------"
        );
        match self.r_squared {
            Some(r2) => println!("R-squared (today): {r2:>8.3}"),
            None => println!("R-squared (today):        -"),
        }
        println!(
            "================================================================================\n"
        );
    }
}
