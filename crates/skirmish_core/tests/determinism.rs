//! Full-battle determinism: identical seeds and identical order
//! sequences must replay to identical state hashes.

use skirmish_core::battle::Battle;
use skirmish_core::math::Vec2;
use skirmish_test_utils::determinism::{find_first_divergence, verify_determinism};
use skirmish_test_utils::fixtures;

/// A squad battle with scripted orders, ready to tick.
fn ordered_battle(seed: u64) -> Battle {
    let mut battle = fixtures::squad_battle(seed);

    // Everyone charges the map center with a preferred target.
    let ids = battle.units().sorted_ids();
    let orders: Vec<(u32, Option<u32>)> = ids
        .iter()
        .map(|&id| {
            let team = battle.units().get(id).unwrap().team;
            let target = ids
                .iter()
                .copied()
                .find(|&other| battle.units().get(other).unwrap().team == team.enemy());
            (id, target)
        })
        .collect();
    for (id, target) in orders {
        battle.plan_route(id, &[Vec2::new(240.0, 180.0)]).unwrap();
        battle.set_attack_target(id, target).unwrap();
    }

    fixtures::enter_playing(&mut battle);
    battle
}

#[test]
fn test_full_battle_replays_exactly() {
    let result = verify_determinism(
        3,
        400,
        || ordered_battle(31),
        |battle| {
            battle.tick(16.0);
        },
        Battle::state_hash,
    );
    result.assert_deterministic();
}

#[test]
fn test_no_divergence_across_long_run() {
    assert_eq!(find_first_divergence(|| ordered_battle(8), 1_000, 16.0), None);
}

#[test]
fn test_variable_tick_cadence_is_deterministic() {
    // Same total time sliced the same way must match; the cadence is
    // part of the input, so both runs use the same slice pattern.
    let deltas = [16.0, 33.0, 8.0, 16.0, 50.0];
    let run = || {
        let mut battle = ordered_battle(12);
        for _ in 0..200 {
            for delta in deltas {
                battle.tick(delta);
            }
        }
        battle.state_hash()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_different_seeds_diverge() {
    let mut a = ordered_battle(100);
    let mut b = ordered_battle(101);
    for _ in 0..200 {
        a.tick(16.0);
        b.tick(16.0);
    }
    assert_ne!(a.state_hash(), b.state_hash());
}

#[test]
fn test_speed_multiplier_changes_trajectory_not_determinism() {
    let run_at = |speed: f32| {
        let mut battle = ordered_battle(55);
        battle.set_speed(speed);
        for _ in 0..300 {
            battle.tick(16.0);
        }
        battle.state_hash()
    };
    // Reproducible at each speed.
    assert_eq!(run_at(1.0), run_at(1.0));
    assert_eq!(run_at(2.0), run_at(2.0));
}
