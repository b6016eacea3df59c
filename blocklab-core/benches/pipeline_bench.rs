//! Criterion benchmarks for BlockLab hot paths.
//!
//! Benchmarks:
//! 1. Zigzag pivot detection
//! 2. Detection stages (pivots through concurrency limit)
//! 3. Full pipeline run including per-zone simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use blocklab_core::analysis::find_pivots;
use blocklab_core::domain::Candle;
use blocklab_core::synthetic::{generate_candles, SyntheticSpec};
use blocklab_core::{Pipeline, StrategyParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let spec = SyntheticSpec {
        count: n,
        ..Default::default()
    };
    generate_candles("BENCH", &spec)
}

fn bench_params() -> StrategyParams {
    StrategyParams {
        zigzag_window_size: 12,
        n_targets: 3,
        max_bounces: 2,
        max_concurrent: 3,
        trailing_sl_target_id: 1,
        ..Default::default()
    }
}

// ── 1. Zigzag ────────────────────────────────────────────────────────

fn bench_zigzag(c: &mut Criterion) {
    let mut group = c.benchmark_group("zigzag");
    for n in [1_000usize, 10_000, 50_000] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| find_pivots(black_box(candles), 12))
        });
    }
    group.finish();
}

// ── 2. Detection ─────────────────────────────────────────────────────

fn bench_detect(c: &mut Criterion) {
    let pipeline = Pipeline::new(bench_params()).unwrap();
    let mut group = c.benchmark_group("detect");
    for n in [1_000usize, 10_000, 50_000] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| pipeline.detect(black_box(candles)))
        });
    }
    group.finish();
}

// ── 3. Full Run ──────────────────────────────────────────────────────

fn bench_run(c: &mut Criterion) {
    let pipeline = Pipeline::new(bench_params()).unwrap();
    let mut group = c.benchmark_group("pipeline_run");
    for n in [1_000usize, 10_000, 50_000] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| pipeline.run("BENCH", black_box(candles)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_zigzag, bench_detect, bench_run);
criterion_main!(benches);
