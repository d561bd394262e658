//! Rule-based summary of the latest relations.

use copbrief_math::linear_quantile;
use ndarray::{Array1, s};

use crate::{ResultRow, ResultTable};

/// Returned when there is nothing to summarize.
pub const NO_DATA_SUMMARY: &str = "No data available to build the summary.";

/// Thresholds behind the summary wording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryConfig {
    /// Contributions at or below this size are not named as drivers.
    pub driver_threshold: f64,
    /// 1-day R² below which the wording is hedged.
    pub r2_threshold: f64,
    /// Residual share of the move above which noise is called out.
    pub residual_share: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { driver_threshold: 0.001, r2_threshold: 0.10, residual_share: 0.30 }
    }
}

/// Whether the latest risk-proxy value sits above its trailing quantile.
///
/// The trailing window is the last `lookback` rows including today. With
/// fewer rows, or no proxy, the day is not risk-on.
#[must_use]
pub fn is_risk_on(proxy: Option<&Array1<f64>>, lookback: usize, quantile: f64) -> bool {
    let Some(proxy) = proxy else { return false };
    let n = proxy.len();
    if n == 0 || lookback == 0 || n < lookback {
        return false;
    }
    let today = proxy[n - 1];
    linear_quantile(&proxy.slice(s![n - lookback..]), quantile)
        .is_some_and(|threshold| today > threshold)
}

/// Build the one or two line summary.
///
/// Drivers come from the 5-day table; the wording is hedged when the 1-day
/// R² is below the threshold or undefined.
#[must_use]
pub fn build_summary(
    one_day: &ResultTable,
    five_day: &ResultTable,
    risk_on: bool,
    config: &SummaryConfig,
) -> String {
    let Some(target) = five_day.target.filter(|_| !five_day.is_empty()) else {
        return NO_DATA_SUMMARY.to_string();
    };

    let mut drivers: Vec<&ResultRow> = five_day
        .factor_rows()
        .filter(|r| r.contribution.abs() > config.driver_threshold)
        .collect();
    drivers.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

    let head = format!("USD/COP moved {target:.3}% (5d, standardized)");
    let mut text = match drivers.as_slice() {
        [a, b, ..] => {
            let verb = if one_day.r_squared.is_none_or(|r2| r2 < config.r2_threshold) {
                "appears to have been driven by"
            } else {
                "was driven by"
            };
            format!(
                "{head}; {verb} {} ({:+.2}) and {} ({:+.2}).",
                a.factor, a.contribution, b.factor, b.contribution
            )
        }
        _ => format!("{head}."),
    };

    let mut notes = Vec::new();
    if five_day.residual().is_some_and(|r| r.abs() > config.residual_share * target.abs()) {
        notes.push("Remaining move is residual, likely local noise.");
    }
    if risk_on {
        notes.push("Global risk-aversion bias.");
    }
    if !notes.is_empty() {
        text.push('\n');
        text.push_str(&notes.join(" "));
    }
    text
}
