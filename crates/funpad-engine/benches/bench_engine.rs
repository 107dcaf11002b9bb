// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK SUITE - funpad-engine
//
// Curve integrals, pool quotes and full routed trades (snapshot included).
// Run: cargo bench -p funpad-engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use funpad_core::{CurveKind, SystemConfig, DEFAULT_CREATION_FEE};
use funpad_engine::{CallContext, Direction, Engine, LaunchRequest, PricingCurve, Rounding};

const UNIT: u128 = 1_000_000;

fn engine_with_asset(target: u128) -> (Engine, String) {
    let mut e = Engine::in_memory("bench", SystemConfig::with_admin("admin"));
    let ctx = CallContext::new("maker", 0).with_value(DEFAULT_CREATION_FEE);
    let id = e
        .launch(&ctx, &LaunchRequest::new("Bench", "BNCH", target))
        .map(|o| o.asset_id)
        .unwrap_or_default();
    (e, id)
}

// ─────────────────────────────────────────────────────────────────
// CURVE MATH
// ─────────────────────────────────────────────────────────────────

fn bench_curve_math(c: &mut Criterion) {
    let curves = [
        ("linear", CurveKind::default()),
        (
            "virtual_product",
            CurveKind::VirtualProduct {
                virtual_base: 30_000_000_000,
                virtual_token: 1_073_000_000 * UNIT,
            },
        ),
    ];
    let mut group = c.benchmark_group("curve");
    for (name, curve) in curves {
        group.bench_with_input(BenchmarkId::new("cost", name), &curve, |b, curve| {
            b.iter(|| black_box(curve.cost(black_box(5_000 * UNIT), 6_000 * UNIT, UNIT, Rounding::Up)))
        });
        group.bench_with_input(BenchmarkId::new("supply_for_cost", name), &curve, |b, curve| {
            b.iter(|| black_box(curve.supply_for_cost(black_box(5_000 * UNIT), 1_000_000_000, UNIT)))
        });
    }
    group.finish();
}

// ─────────────────────────────────────────────────────────────────
// ROUTED TRADES
// ─────────────────────────────────────────────────────────────────

fn bench_curve_buy(c: &mut Criterion) {
    let (mut e, id) = engine_with_asset(50_000_000_000);
    let mut ts = 0u64;
    c.bench_function("engine/curve_buy", |b| {
        b.iter(|| {
            ts += 1;
            let ctx = CallContext::new("alice", ts).with_value(1_000);
            black_box(e.buy(&ctx, &id, 0, None))
        })
    });
}

fn bench_pool_quote(c: &mut Criterion) {
    let (mut e, id) = engine_with_asset(1_000);
    let _ = e.buy(&CallContext::new("seed", 1).with_value(1_000), &id, 0, None);
    c.bench_function("engine/pool_quote", |b| {
        b.iter(|| black_box(e.quote(&id, Direction::Buy, black_box(10_000))))
    });
}

fn bench_pool_round_trip(c: &mut Criterion) {
    let (mut e, id) = engine_with_asset(1_000);
    let _ = e.buy(&CallContext::new("seed", 1).with_value(1_000), &id, 0, None);
    let mut ts = 1u64;
    c.bench_function("engine/pool_buy_sell", |b| {
        b.iter(|| {
            ts += 1;
            let out = e
                .buy(&CallContext::new("alice", ts).with_value(10_000), &id, 0, None)
                .map(|r| r.amount_out)
                .unwrap_or(0);
            black_box(e.sell(&CallContext::new("alice", ts), &id, out, 0, None))
        })
    });
}

criterion_group!(
    benches,
    bench_curve_math,
    bench_curve_buy,
    bench_pool_quote,
    bench_pool_round_trip
);
criterion_main!(benches);
