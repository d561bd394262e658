//! Benchmarks for copbrief-math operations.
#![allow(missing_docs)]

use copbrief_math::{
    linear_quantile, min_max_normalize, nan_std, ordinary_least_squares, pearson_correlation,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

fn random_returns(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    let normal = Normal::new(0.0, 0.01).unwrap();
    Array1::from_iter((0..n).map(|_| normal.sample(&mut rng)))
}

fn random_design(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |(_, j)| if j == 0 { 1.0 } else { rng.r#gen::<f64>() })
}

fn bench_ols(c: &mut Criterion) {
    let mut group = c.benchmark_group("ols");

    for (rows, cols) in [(90, 4), (90, 5), (252, 5), (1000, 8)] {
        group.bench_with_input(
            BenchmarkId::new("rows_cols", format!("{rows}x{cols}")),
            &(rows, cols),
            |b, &(rows, cols)| {
                let y = random_returns(rows);
                let x = random_design(rows, cols);
                b.iter(|| ordinary_least_squares(black_box(&y), black_box(&x)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_window_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_stats");

    for size in [90, 252, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        let x = random_returns(size);
        let y = random_returns(size);

        group.bench_with_input(BenchmarkId::new("nan_std", size), &size, |b, _| {
            b.iter(|| nan_std(black_box(&x.view())));
        });
        group.bench_with_input(BenchmarkId::new("pearson", size), &size, |b, _| {
            b.iter(|| pearson_correlation(black_box(&x.view()), black_box(&y.view())));
        });
        group.bench_with_input(BenchmarkId::new("quantile", size), &size, |b, _| {
            b.iter(|| linear_quantile(black_box(&x.view()), 0.8));
        });
    }

    group.finish();
}

fn bench_min_max(c: &mut Criterion) {
    let data = random_returns(5);
    c.bench_function("min_max_5", |b| b.iter(|| min_max_normalize(black_box(&data))));
}

criterion_group!(benches, bench_ols, bench_window_stats, bench_min_max);
criterion_main!(benches);
