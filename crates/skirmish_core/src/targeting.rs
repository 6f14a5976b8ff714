//! Target acquisition and visibility.

use crate::battlefield::Battlefield;
use crate::math::Vec2;
use crate::units::{Unit, UnitArena, UnitId};

/// True iff no obstacle blocks the segment `a`-`b`.
///
/// Combat-time visibility uses zero padding: grazing an obstacle edge
/// still counts as visible.
#[must_use]
pub fn line_of_sight(a: Vec2, b: Vec2, field: &Battlefield) -> bool {
    field
        .obstacles
        .iter()
        .all(|o| !o.rect.intersects_segment(a, b))
}

/// Pick an enemy for `unit` to engage.
///
/// A preferred id wins if that enemy is alive and visible. Otherwise a
/// single scan tracks both the nearest enemy overall and the nearest
/// visible one; the visible one is preferred, with the overall nearest
/// as fallback so units still face and approach unseen enemies instead
/// of idling. `None` only when no enemies remain alive.
#[must_use]
pub fn find_target(
    unit: &Unit,
    arena: &UnitArena,
    preferred: Option<UnitId>,
    field: &Battlefield,
) -> Option<UnitId> {
    if let Some(id) = preferred {
        if let Some(enemy) = arena.get(id) {
            if enemy.alive
                && enemy.team != unit.team
                && line_of_sight(unit.pos, enemy.pos, field)
            {
                return Some(id);
            }
        }
    }

    let mut nearest: Option<(UnitId, f32)> = None;
    let mut nearest_visible: Option<(UnitId, f32)> = None;

    for id in arena.sorted_ids() {
        let Some(enemy) = arena.get(id) else { continue };
        if !enemy.alive || enemy.team == unit.team {
            continue;
        }
        let dist_sq = unit.pos.distance_squared(enemy.pos);
        if nearest.map_or(true, |(_, best)| dist_sq < best) {
            nearest = Some((id, dist_sq));
        }
        if line_of_sight(unit.pos, enemy.pos, field)
            && nearest_visible.map_or(true, |(_, best)| dist_sq < best)
        {
            nearest_visible = Some((id, dist_sq));
        }
    }

    nearest_visible.or(nearest).map(|(id, _)| id)
}

/// Whether `target` is within the attacker's effective range.
///
/// Effective range = base range × (1 + bonus_per_zone × overlapping
/// elevation zones at the attacker) + both collision radii. The bonus
/// stacks additively and is measured at the attacker's position only.
#[must_use]
pub fn is_in_range(
    attacker: &Unit,
    target: &Unit,
    field: &Battlefield,
    bonus_per_zone: f32,
) -> bool {
    let zones = field.elevation_overlap_count(attacker.pos) as f32;
    let stats = attacker.stats();
    let reach =
        stats.range * (1.0 + bonus_per_zone * zones) + stats.radius + target.stats().radius;
    attacker.pos.distance_squared(target.pos) <= reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::{ElevationZone, MapConfig, Obstacle};
    use crate::math::Rect;
    use crate::units::{Team, UnitKind};

    fn empty_field() -> Battlefield {
        let mut field = Battlefield::generate(&MapConfig::default().with_seed(1));
        field.obstacles.clear();
        field.elevation_zones.clear();
        field
    }

    #[test]
    fn test_line_of_sight_blocked_by_obstacle() {
        let mut field = empty_field();
        field.obstacles.push(Obstacle {
            rect: Rect::new(200.0, 150.0, 40.0, 60.0),
        });
        let a = Vec2::new(100.0, 180.0);
        let b = Vec2::new(380.0, 180.0);
        assert!(!line_of_sight(a, b, &field));
        assert!(line_of_sight(a, Vec2::new(100.0, 300.0), &field));
    }

    #[test]
    fn test_preferred_target_wins_when_visible() {
        let field = empty_field();
        let mut arena = UnitArena::new();
        let me = arena.spawn(UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let near = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        let far = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(400.0, 100.0));

        let unit = arena.get(me).unwrap().clone();
        assert_eq!(find_target(&unit, &arena, Some(far), &field), Some(far));
        assert_eq!(find_target(&unit, &arena, None, &field), Some(near));
    }

    #[test]
    fn test_dead_preferred_target_falls_back() {
        let field = empty_field();
        let mut arena = UnitArena::new();
        let me = arena.spawn(UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let near = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        let far = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(400.0, 100.0));
        arena.get_mut(far).unwrap().apply_damage(1e6);

        let unit = arena.get(me).unwrap().clone();
        assert_eq!(find_target(&unit, &arena, Some(far), &field), Some(near));
    }

    #[test]
    fn test_hidden_enemy_still_targeted_when_none_visible() {
        let mut field = empty_field();
        field.obstacles.push(Obstacle {
            rect: Rect::new(200.0, 0.0, 40.0, 360.0),
        });
        let mut arena = UnitArena::new();
        let me = arena.spawn(UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 180.0));
        let hidden = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(380.0, 180.0));

        let unit = arena.get(me).unwrap().clone();
        assert_eq!(find_target(&unit, &arena, None, &field), Some(hidden));
    }

    #[test]
    fn test_no_living_enemies_returns_none() {
        let field = empty_field();
        let mut arena = UnitArena::new();
        let me = arena.spawn(UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let enemy = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        arena.get_mut(enemy).unwrap().apply_damage(1e6);

        let unit = arena.get(me).unwrap().clone();
        assert_eq!(find_target(&unit, &arena, None, &field), None);
    }

    #[test]
    fn test_range_monotone_in_zone_count() {
        let mut field = empty_field();
        let attacker = Unit::new(1, UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        // Just past base reach: 110 + 7 + 7 = 124.
        let target = Unit::new(2, UnitKind::Rifleman, Team::Red, Vec2::new(240.0, 100.0));

        assert!(!is_in_range(&attacker, &target, &field, 0.25));

        let zone = ElevationZone {
            rect: Rect::new(80.0, 80.0, 40.0, 40.0),
        };
        field.elevation_zones.push(zone);
        assert!(is_in_range(&attacker, &target, &field, 0.25));

        // More overlap never shrinks reach.
        field.elevation_zones.push(zone);
        assert!(is_in_range(&attacker, &target, &field, 0.25));
    }
}
