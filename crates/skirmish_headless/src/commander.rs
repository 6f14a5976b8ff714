//! Scripted planning-phase commander.
//!
//! Stands in for the planning UI (or an external tactical AI): each
//! planning phase it routes every unit toward its nearest enemy and
//! sets that enemy as the preferred target. Deterministic by iterating
//! in sorted unit-id order.

use tracing::debug;

use skirmish_core::battle::Battle;
use skirmish_core::math::Vec2;
use skirmish_core::units::{Team, UnitId};

/// How far short of the enemy a unit's approach point stops, as a
/// fraction of its weapon range.
const STANDOFF_FRACTION: f32 = 0.6;

/// Issue orders for every living unit on `team`.
///
/// Each unit advances to a standoff point short of its nearest living
/// enemy, so it arrives in range rather than on top of the target.
pub fn issue_orders(battle: &mut Battle, team: Team) {
    let plans: Vec<(UnitId, Vec2, UnitId)> = battle
        .units()
        .sorted_ids()
        .into_iter()
        .filter_map(|id| {
            let unit = battle.units().get(id)?;
            if !unit.alive || unit.team != team {
                return None;
            }
            let (enemy_id, enemy_pos) = nearest_enemy(battle, unit.pos, team)?;
            let to_enemy = enemy_pos - unit.pos;
            let dist = to_enemy.length();
            let standoff = unit.stats().range * STANDOFF_FRACTION;
            let approach = if dist > standoff && dist > 1e-3 {
                unit.pos + to_enemy * ((dist - standoff) / dist)
            } else {
                unit.pos
            };
            Some((id, approach, enemy_id))
        })
        .collect();

    for (id, approach, enemy_id) in plans {
        // Orders are clamped and detoured inside the engine.
        if let Err(err) = battle.plan_route(id, &[approach]) {
            debug!(unit = id, %err, "route order dropped");
            continue;
        }
        let _ = battle.set_attack_target(id, Some(enemy_id));
    }
}

fn nearest_enemy(battle: &Battle, from: Vec2, team: Team) -> Option<(UnitId, Vec2)> {
    let mut best: Option<(UnitId, Vec2, f32)> = None;
    for id in battle.units().sorted_ids() {
        let Some(unit) = battle.units().get(id) else { continue };
        if !unit.alive || unit.team == team {
            continue;
        }
        let dist_sq = from.distance_squared(unit.pos);
        if best.map_or(true, |(_, _, b)| dist_sq < b) {
            best = Some((id, unit.pos, dist_sq));
        }
    }
    best.map(|(id, pos, _)| (id, pos))
}
