//! Engine throughput benchmarks
//!
//! Quoting runs once per candidate route, so the Newton solvers and the
//! log/exp power path dominate routing latency.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parity_amm::{AmplificationParameter, LinearMath, LinearParams, StableMath, WeightedMath};
use parity_types::FixedPoint;

fn fp(s: &str) -> FixedPoint {
    FixedPoint::from_decimal_str(s).unwrap()
}

/// Balanced-ish stable pool with `n` tokens around one million each
fn stable_balances(n: usize) -> Vec<FixedPoint> {
    (0..n)
        .map(|i| FixedPoint::from_integer(1_000_000 + 37_000 * i as u128))
        .collect()
}

fn bench_stable_invariant(c: &mut Criterion) {
    let amp = AmplificationParameter::new(200).unwrap();
    let mut group = c.benchmark_group("stable_invariant");

    for n in [2usize, 3, 5] {
        let balances = stable_balances(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &balances, |b, balances| {
            b.iter(|| black_box(StableMath::calculate_invariant(amp, black_box(balances))))
        });
    }
    group.finish();
}

fn bench_stable_swap(c: &mut Criterion) {
    let amp = AmplificationParameter::new(200).unwrap();
    let balances = stable_balances(3);
    let amount = fp("2500.5");

    c.bench_function("stable_out_given_in", |b| {
        b.iter(|| black_box(StableMath::calc_out_given_in(amp, &balances, 0, 2, black_box(amount))))
    });

    c.bench_function("stable_in_given_out", |b| {
        b.iter(|| black_box(StableMath::calc_in_given_out(amp, &balances, 0, 2, black_box(amount))))
    });
}

fn bench_weighted_swap(c: &mut Criterion) {
    let (w80, w20) = (fp("0.8"), fp("0.2"));
    let (half, amount) = (fp("0.5"), fp("12.75"));
    let (balance_in, balance_out) = (fp("5000"), fp("1250"));

    // Equal weights hit the pow fast path
    c.bench_function("weighted_out_given_in_50_50", |b| {
        b.iter(|| {
            black_box(WeightedMath::calc_out_given_in(
                balance_in,
                half,
                balance_out,
                half,
                black_box(amount),
            ))
        })
    });

    c.bench_function("weighted_out_given_in_80_20", |b| {
        b.iter(|| {
            black_box(WeightedMath::calc_out_given_in(
                balance_in,
                w80,
                balance_out,
                w20,
                black_box(amount),
            ))
        })
    });

    let weights = vec![fp("0.4"), fp("0.3"), fp("0.2"), fp("0.1")];
    let balances = vec![fp("4000"), fp("3000"), fp("2000"), fp("1000")];
    c.bench_function("weighted_invariant_4_tokens", |b| {
        b.iter(|| black_box(WeightedMath::calculate_invariant(&weights, black_box(&balances))))
    });
}

fn bench_linear(c: &mut Criterion) {
    let params = LinearParams::new(fp("0.01"), fp("1.05"), fp("1000"), fp("2000")).unwrap();
    let (hundred, quarter) = (fp("100"), fp("250"));
    let (main_low, main_high, wrapped, supply) = (fp("500"), fp("1800"), fp("3000"), fp("5000"));

    c.bench_function("linear_main_out_per_wrapped_in", |b| {
        b.iter(|| {
            black_box(LinearMath::calc_main_out_per_wrapped_in(
                black_box(hundred),
                main_low,
                &params,
            ))
        })
    });

    c.bench_function("linear_bpt_out_per_main_in", |b| {
        b.iter(|| {
            black_box(LinearMath::calc_bpt_out_per_main_in(
                black_box(quarter),
                main_high,
                wrapped,
                supply,
                &params,
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_stable_invariant,
    bench_stable_swap,
    bench_weighted_swap,
    bench_linear
);
criterion_main!(benches);
