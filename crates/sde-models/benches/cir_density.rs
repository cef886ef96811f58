use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use sde_math::bessel_i_scaled;
use sde_models::{CirModel, ProcessModel};
use std::hint::black_box;

fn weekly_path(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.05 + 0.01 * (i as f64 * 0.37).sin())
        .collect()
}

fn bench_exact_density(c: &mut Criterion) {
    let cases = [
        ("asymptotic", CirModel::new(2.0, 0.05, 0.1), 1.0 / 52.0),
        ("series", CirModel::new(0.5, 0.03, 0.2), 1.0),
        ("stiff", CirModel::new(5.0, 0.05, 0.1), 0.01),
    ];

    let mut group = c.benchmark_group("cir_exact_density");
    for (name, model, dt) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| {
                model
                    .exact_density(black_box(0.04), black_box(0.045), 0.0, *dt)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_log_likelihood(c: &mut Criterion) {
    let model = CirModel::new(2.0, 0.05, 0.1);
    let path = weekly_path(1_000);

    let mut group = c.benchmark_group("cir_log_likelihood");
    group.throughput(Throughput::Elements(path.len() as u64 - 1));
    group.bench_function("weekly_1000", |b| {
        b.iter(|| model.log_likelihood(black_box(&path), 1.0 / 52.0).unwrap())
    });
    group.finish();
}

fn bench_bessel(c: &mut Criterion) {
    let mut group = c.benchmark_group("bessel_i_scaled");
    for (name, nu, x) in [("small", 0.7, 2.0), ("moderate", 19.0, 300.0), ("large", 19.0, 1_060.0)] {
        group.bench_function(name, |b| b.iter(|| bessel_i_scaled(black_box(nu), black_box(x))));
    }
    group.finish();
}

criterion_group!(benches, bench_exact_density, bench_log_likelihood, bench_bessel);
criterion_main!(benches);
