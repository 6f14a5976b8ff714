//! Tick pipeline benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use skirmish_core::battle::{Battle, BattleConfig};
use skirmish_core::math::Vec2;
use skirmish_core::pathing::{detour, DEFAULT_MAX_DEPTH};
use skirmish_core::units::UnitKind;

fn charging_squads(per_side: usize) -> Battle {
    let squad: Vec<UnitKind> = (0..per_side)
        .map(|i| match i % 4 {
            0 => UnitKind::Rifleman,
            1 => UnitKind::Scout,
            2 => UnitKind::Sniper,
            _ => UnitKind::Gunner,
        })
        .collect();

    let mut battle = Battle::new(
        BattleConfig::default()
            .with_seed(77)
            .with_round_duration_ms(600_000.0)
            .with_idle_completion_ms(600_000.0),
    );
    battle.start(&squad, &squad).unwrap();

    let center = Vec2::new(240.0, 180.0);
    for id in battle.units().sorted_ids() {
        battle.plan_route(id, &[center]).unwrap();
    }
    battle.confirm_plan().unwrap();
    battle.skip_cover().unwrap();
    battle.confirm_plan().unwrap();
    battle
}

pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for per_side in [5usize, 20, 50] {
        group.bench_function(format!("{per_side}v{per_side}"), |b| {
            let mut battle = charging_squads(per_side);
            // Warm the battle into mid-fight so projectiles are live.
            for _ in 0..120 {
                battle.tick(16.0);
            }
            b.iter(|| {
                battle.tick(black_box(16.0));
            });
        });
    }

    group.finish();
}

pub fn detour_benchmark(c: &mut Criterion) {
    let field = skirmish_core::battlefield::Battlefield::generate(
        &skirmish_core::battlefield::MapConfig::default().with_seed(77),
    );

    c.bench_function("detour_across_map", |b| {
        b.iter(|| {
            black_box(detour(
                black_box(Vec2::new(20.0, 180.0)),
                black_box(Vec2::new(460.0, 180.0)),
                &field,
                8.0,
                DEFAULT_MAX_DEPTH,
            ))
        })
    });
}

criterion_group!(benches, tick_benchmark, detour_benchmark);
criterion_main!(benches);
