//! Criterion benchmarks for the token supply schedule.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fractal_core::traits::SupplySchedule;
use fractal_supply::TokenSupplySchedule;

fn bench_point(c: &mut Criterion) {
    let schedule = TokenSupplySchedule::default();
    c.bench_function("supply_point_decay", |b| b.iter(|| schedule.point(black_box(22.0))));
    c.bench_function("supply_point_constant", |b| b.iter(|| schedule.point(black_box(300.0))));
}

fn bench_table(c: &mut Criterion) {
    let schedule = TokenSupplySchedule::default();
    c.bench_function("supply_table_520", |b| b.iter(|| schedule.table(black_box(520))));
}

fn bench_cumulative(c: &mut Criterion) {
    let schedule = TokenSupplySchedule::default();
    c.bench_function("cumulative_token_integral_100", |b| {
        b.iter(|| schedule.cumulative_token_integral(black_box(100)))
    });
}

criterion_group!(benches, bench_point, bench_table, bench_cumulative);
criterion_main!(benches);
