//! Benchmarks for copbrief-model relations estimation.
#![allow(missing_docs)]

use copbrief_factors::FactorFrame;
use copbrief_model::{RelationsEngine, RollingRegressor};
use copbrief_primitives::{Date, FactorName, Horizon};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand_distr::{Distribution, Normal};

fn random_frame(rows: usize, factors: usize) -> FactorFrame {
    let mut rng = rand::thread_rng();
    let normal = Normal::new(0.0, 1.0).unwrap();
    let values = Array2::from_shape_fn((rows, factors), |_| normal.sample(&mut rng));
    let target = Array1::from_shape_fn(rows, |i| {
        0.4 * values[[i, 0]] - 0.2 * values[[i, 1 % factors]] + normal.sample(&mut rng)
    });
    FactorFrame::new(
        Horizon::FiveDay,
        Date::from_ymd_opt(2015, 1, 1).unwrap().iter_days().take(rows).collect(),
        target,
        (0..factors).map(|j| FactorName::new(format!("F{j}"))).collect(),
        values,
        None,
    )
    .unwrap()
}

fn random_prices(days: usize) -> DataFrame {
    let mut rng = rand::thread_rng();
    let normal = Normal::new(0.0, 0.01).unwrap();
    let tickers = ["COP=X", "DX-Y.NYB", "BZ=F", "USDMXN=X", "USDCLP=X", "GXG", "ICOL", "^VIX"];
    let start = Date::from_ymd_opt(2018, 1, 1).unwrap();

    let mut dates = Vec::with_capacity(days * tickers.len());
    let mut names = Vec::with_capacity(days * tickers.len());
    let mut changes = Vec::with_capacity(days * tickers.len());
    for date in start.iter_days().take(days) {
        for ticker in tickers {
            dates.push(date);
            names.push(ticker);
            changes.push(normal.sample(&mut rng));
        }
    }
    DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("ticker".into(), names),
        Column::new("pct_change".into(), changes),
    ])
    .unwrap()
}

fn bench_rolling_regressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_regressor");
    group.sample_size(30);

    for (rows, factors, name) in [(252, 3, "1y_1d"), (750, 4, "3y_5d"), (2500, 4, "10y_5d")] {
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(
            BenchmarkId::new("history", name),
            &(rows, factors),
            |b, &(rows, factors)| {
                let frame = random_frame(rows, factors);
                let regressor = RollingRegressor::new();
                b.iter(|| regressor.fit(black_box(&frame)));
            },
        );
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("relations_engine");
    group.sample_size(10);

    for days in [500, 1500] {
        group.bench_with_input(BenchmarkId::new("days", days), &days, |b, &days| {
            let prices = random_prices(days);
            let engine = RelationsEngine::new();
            b.iter(|| engine.run(black_box(&prices)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rolling_regressor, bench_engine);
criterion_main!(benches);
