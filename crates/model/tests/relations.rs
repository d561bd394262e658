//! End-to-end tests of the relations engine on synthetic panels.

use approx::assert_relative_eq;
use copbrief_factors::{CompoundReturns, returns_for_horizon};
use copbrief_model::{
    FallbackReason, FitOutcome, ModelError, NO_DATA_SUMMARY, OlsEstimator, RelationsConfig,
    RelationsEngine,
};
use copbrief_primitives::{Date, Horizon, LOCAL_FACTOR, RESIDUAL, ReturnMatrix, Ticker};
use copbrief_traits::{EstimatorError, WindowEstimator};
use copbrief_utils::{PanelBuilder, UtilsError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rstest::rstest;

const TICKERS: [&str; 8] = ["COP=X", "DX-Y.NYB", "BZ=F", "USDMXN=X", "USDCLP=X", "GXG", "ICOL", "^VIX"];

fn start() -> Date {
    Date::from_ymd_opt(2022, 1, 3).unwrap()
}

/// Daily changes where USD/COP loads on the dollar, the region and oil.
fn synthetic_returns(days: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 0.01).unwrap();
    let mut values = Array2::zeros((days, TICKERS.len()));
    for i in 0..days {
        for j in 1..TICKERS.len() {
            values[[i, j]] = normal.sample(&mut rng);
        }
        let dxy_lag = if i > 0 { values[[i - 1, 1]] } else { 0.0 };
        values[[i, 0]] = 0.5 * dxy_lag + 0.3 * (values[[i, 3]] + values[[i, 4]]) / 2.0
            - 0.2 * values[[i, 2]]
            + 0.5 * normal.sample(&mut rng);
    }
    values
}

fn long_frame(values: &Array2<f64>, tickers: &[&str]) -> DataFrame {
    let mut dates = Vec::new();
    let mut names = Vec::new();
    let mut changes = Vec::new();
    for (i, date) in start().iter_days().take(values.nrows()).enumerate() {
        for (j, ticker) in TICKERS.iter().enumerate() {
            if tickers.contains(ticker) {
                dates.push(date);
                names.push(*ticker);
                changes.push(values[[i, j]]);
            }
        }
    }
    DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("ticker".into(), names),
        Column::new("pct_change".into(), changes),
    ])
    .unwrap()
}

fn panel(values: Array2<f64>) -> ReturnMatrix {
    ReturnMatrix::new(
        start().iter_days().take(values.nrows()).collect(),
        TICKERS.iter().map(|t| Ticker::new(*t)).collect(),
        values,
    )
}

#[rstest]
#[case(Horizon::OneDay)]
#[case(Horizon::FiveDay)]
fn contributions_and_residual_sum_to_target(#[case] horizon: Horizon) {
    let report = RelationsEngine::new().run(&long_frame(&synthetic_returns(300, 7), &TICKERS)).unwrap();
    let relations = report.horizon(horizon);
    let frame = relations.frame();
    let contributions = relations.contributions();

    for i in 0..frame.n_rows() {
        let target = frame.target()[i];
        let residual = contributions.residual()[i];
        if relations.model().coefficients(i).is_none() {
            assert_eq!(residual, 0.0);
            assert!(contributions.row(i).iter().all(|c| *c == 0.0));
            continue;
        }
        assert_relative_eq!(contributions.explained(i) + residual, target, epsilon = 1e-12);
        for c in contributions.row(i) {
            assert!(c.abs() <= 0.8 * target.abs() + 1e-12);
        }
    }
}

#[test]
fn regression_starts_at_ninetieth_row() {
    let report = RelationsEngine::new().run(&long_frame(&synthetic_returns(200, 11), &TICKERS)).unwrap();
    for relations in [report.one_day(), report.five_day()] {
        let model = relations.model();
        assert_eq!(model.outcome(89), Some(&FitOutcome::Warmup));
        assert_eq!(model.outcome(90), Some(&FitOutcome::Fitted));
        assert_eq!(model.fitted_count(), 110);
        assert!(model.r_squared(90).is_some());
        assert!((0..90).all(|i| relations.contributions().residual()[i] == 0.0));
    }
}

#[test]
fn tables_describe_latest_day() {
    let report = RelationsEngine::new().run(&long_frame(&synthetic_returns(260, 3), &TICKERS)).unwrap();
    let [one_day, five_day] = report.tables();

    let names = |t: &copbrief_model::ResultTable| {
        t.rows.iter().map(|r| r.factor.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(one_day), vec!["DXY_L1", "LA_USD", "BZ_lag1", RESIDUAL]);
    assert_eq!(names(five_day), vec!["DXY_L1", "LA_USD", "BZ_lag1", LOCAL_FACTOR, RESIDUAL]);
    assert_eq!(five_day.date, start().iter_days().nth(259));

    for table in [one_day, five_day] {
        let explained: f64 = table.factor_rows().map(|r| r.contribution).sum();
        assert_relative_eq!(
            explained + table.residual().unwrap(),
            table.target.unwrap(),
            epsilon = 1e-12
        );
        for row in table.factor_rows() {
            let score = row.score.unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }
    assert!(report.summary().starts_with("USD/COP moved"));
    // Fewer than 252 risk-proxy rows never counts as risk-on.
    let short = RelationsEngine::new().run(&long_frame(&synthetic_returns(200, 3), &TICKERS)).unwrap();
    assert!(!short.risk_on());
}

#[test]
fn zero_target_day_caps_everything() {
    let mut values = synthetic_returns(150, 5);
    values[[149, 0]] = f64::NAN;
    let report = RelationsEngine::new().run_panel(&panel(values)).unwrap();

    let relations = report.one_day();
    assert_eq!(relations.frame().target()[149], 0.0);
    assert!(relations.model().coefficients(149).is_some());
    assert!(relations.contributions().row(149).iter().all(|c| *c == 0.0));
    assert_eq!(relations.contributions().residual()[149], 0.0);
    assert!(relations.table().factor_rows().all(|r| r.contribution == 0.0));
}

/// OLS, except that windows starting with a negative target come back as NaN.
#[derive(Debug, Clone)]
struct FlakyEstimator;

impl WindowEstimator for FlakyEstimator {
    fn fit(&self, y: &Array1<f64>, x: &Array2<f64>) -> Result<Array1<f64>, EstimatorError> {
        if y[0] < 0.0 {
            return Ok(Array1::from_elem(x.ncols(), f64::NAN));
        }
        OlsEstimator.fit(y, x)
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[test]
fn nan_coefficients_fall_back_to_historical_mean() {
    let engine = RelationsEngine::new().with_estimator(FlakyEstimator);
    let report = engine.run(&long_frame(&synthetic_returns(250, 13), &TICKERS)).unwrap();
    let model = report.five_day().model();

    let mut numerical = 0;
    for i in 0..model.len() {
        if let Some(c) = model.coefficients(i) {
            assert!(c.iter().all(|v| v.is_finite()));
        }
        let Some(FitOutcome::Fallback { reason: FallbackReason::Numerical(_), restored }) =
            model.outcome(i)
        else {
            continue;
        };
        numerical += 1;
        let earlier: Vec<&Array1<f64>> = (0..i).filter_map(|p| model.coefficients(p)).collect();
        assert_eq!(*restored, !earlier.is_empty());
        if let Some(c) = model.coefficients(i) {
            let mean = earlier.iter().fold(Array1::zeros(c.len()), |acc, e| acc + *e)
                / earlier.len() as f64;
            for (a, b) in c.iter().zip(mean.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-10);
            }
        }
    }
    assert!(numerical > 0);
    assert!(model.fitted_count() > 0);
}

#[test]
fn local_selection_is_deterministic() {
    let prices = long_frame(&synthetic_returns(220, 21), &TICKERS);
    let engine = RelationsEngine::new();
    let first = engine.run(&prices).unwrap();
    let second = engine.run(&prices).unwrap();
    assert_eq!(first.local_risk(), second.local_risk());
    assert_eq!(first.summary(), second.summary());
    assert!(!first.local_risk().defaulted);
}

/// The latest day's contributions and residual add back up to its target.
fn assert_latest_day_adds_up(table: &copbrief_model::ResultTable) {
    let target = table.target.unwrap();
    let explained: f64 = table.factor_rows().map(|r| r.contribution).sum();
    assert!(target != 0.0);
    assert_relative_eq!(explained + table.residual().unwrap(), target, epsilon = 1e-12);
    assert!(table.factor_rows().any(|r| r.contribution != 0.0));
}

#[test]
fn missing_local_candidates_use_default() {
    let tickers: Vec<&str> =
        TICKERS.iter().copied().filter(|t| *t != "GXG" && *t != "ICOL").collect();
    let report = RelationsEngine::new().run(&long_frame(&synthetic_returns(300, 2), &tickers)).unwrap();
    assert!(report.local_risk().defaulted);
    assert_eq!(report.local_risk().ticker, Ticker::new("GXG"));
    let local = report.five_day().frame().factor(LOCAL_FACTOR).unwrap();
    assert!(local.iter().all(|v| *v == 0.0));

    let model = report.five_day().model();
    assert_eq!(model.fitted_count(), 210);
    assert_eq!(model.fallback_count(), 0);
    assert_relative_eq!(model.factor_coefficients(299).unwrap()[3], 0.0, epsilon = 1e-12);

    let table = report.five_day().table();
    assert_eq!(table.row(LOCAL_FACTOR).unwrap().contribution, 0.0);
    assert_latest_day_adds_up(table);
    assert!(report.summary().starts_with("USD/COP moved"));
}

#[test]
fn missing_regional_pairs_leave_both_horizons_fitted() {
    let tickers: Vec<&str> =
        TICKERS.iter().copied().filter(|t| *t != "USDMXN=X" && *t != "USDCLP=X").collect();
    let report = RelationsEngine::new().run(&long_frame(&synthetic_returns(300, 9), &tickers)).unwrap();

    for relations in [report.one_day(), report.five_day()] {
        let regional = relations.frame().factor("LA_USD").unwrap();
        assert!(regional.iter().all(|v| *v == 0.0));

        let model = relations.model();
        assert_eq!(model.fitted_count(), 210);
        assert_relative_eq!(model.factor_coefficients(299).unwrap()[1], 0.0, epsilon = 1e-12);

        let table = relations.table();
        assert_eq!(table.row("LA_USD").unwrap().contribution, 0.0);
        assert_latest_day_adds_up(table);
    }
}

#[rstest]
#[case("COP=X")]
#[case("DX-Y.NYB")]
#[case("BZ=F")]
fn required_tickers(#[case] missing: &str) {
    let tickers: Vec<&str> = TICKERS.iter().copied().filter(|t| *t != missing).collect();
    let err = RelationsEngine::new().run(&long_frame(&synthetic_returns(120, 1), &tickers)).unwrap_err();
    assert!(matches!(&err, ModelError::MissingTicker(t) if t == missing));
}

#[test]
fn duplicate_keys_fail_loudly() {
    let prices = long_frame(&synthetic_returns(100, 4), &TICKERS);
    let doubled = prices.vstack(&prices.head(Some(1))).unwrap();
    let err = RelationsEngine::new().run(&doubled).unwrap_err();
    assert!(matches!(err, ModelError::Panel(UtilsError::DuplicateKey { .. })));
}

#[test]
fn custom_config_changes_windows() {
    let config = RelationsConfig {
        regression_window: 60,
        regression_min_observations: 20,
        zscore_window: 30,
        ..RelationsConfig::default()
    };
    let report =
        RelationsEngine::with_config(config).run(&long_frame(&synthetic_returns(100, 8), &TICKERS)).unwrap();
    assert_eq!(report.one_day().model().outcome(60), Some(&FitOutcome::Fitted));
    assert_eq!(report.one_day().frame().target()[28], 0.0);
    assert!(report.one_day().frame().target()[29] != 0.0);
    assert_ne!(report.summary(), NO_DATA_SUMMARY);
}

#[test]
fn constant_returns_panel() {
    let days = 100;
    let mut dates = Vec::new();
    let mut names = Vec::new();
    let mut changes = Vec::new();
    for date in start().iter_days().take(days) {
        for (ticker, change) in [("A", 0.01), ("B", 0.02)] {
            dates.push(date);
            names.push(ticker);
            changes.push(change);
        }
    }
    let long = DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("ticker".into(), names),
        Column::new("pct_change".into(), changes),
    ])
    .unwrap();

    let panel = PanelBuilder::new().build(&long).unwrap();
    assert_eq!(panel.n_rows(), days);
    assert!(panel.values().iter().all(|v| v.is_finite()));

    let five_day = returns_for_horizon(&panel, Horizon::FiveDay, &CompoundReturns::default());
    assert_relative_eq!(five_day.column("A").unwrap()[10], 1.01_f64.powi(5) - 1.0, epsilon = 1e-12);
    assert_relative_eq!(five_day.column("B").unwrap()[10], 1.02_f64.powi(5) - 1.0, epsilon = 1e-12);
}
