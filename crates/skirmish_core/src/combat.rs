//! Ranged combat: gun rotation, firing gate, projectiles, hit resolution.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::events::HitEvent;
use crate::math::{angle_delta, circles_overlap, normalize_angle, Vec2};
use crate::units::{Team, Unit, UnitArena, UnitId};

/// Facing must be within this many radians of the target bearing to fire.
pub const AIM_TOLERANCE: f32 = 0.15;

/// Hits arriving more than this far off the target's facing are flanks.
pub const FLANK_ANGLE: f32 = 2.0;

/// Damage multiplier applied to flanking hits.
pub const FLANK_MULTIPLIER: f32 = 1.5;

/// Knockback distance per point of raw (pre-multiplier) damage.
const KNOCKBACK_PER_DAMAGE: f32 = 0.12;

/// Lead-aim refinement iterations against moving targets.
const LEAD_ITERATIONS: u32 = 2;

/// Trail buffer length (render-only).
const TRAIL_LEN: usize = 8;

/// Extra flight allowance beyond effective range: lead aim can
/// lengthen the path to a moving target.
const RANGE_GRACE: f32 = 30.0;

/// A projectile in flight. Owned exclusively by the battle's per-tick
/// projectile collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// Current position.
    pub pos: Vec2,
    /// Velocity in map units per second.
    pub vel: Vec2,
    /// Damage dealt on hit, before the flank multiplier. Halves after
    /// each pierced target.
    pub damage: f32,
    /// Collision radius.
    pub radius: f32,
    /// Firing side.
    pub team: Team,
    /// Flight distance after which the projectile expires.
    pub max_range: f32,
    /// Cumulative distance flown.
    pub distance_traveled: f32,
    /// Recent positions, bounded, for rendering only.
    pub trail: VecDeque<Vec2>,
    /// Whether the projectile continues past hits.
    pub piercing: bool,
    /// Units already struck (piercing rounds only).
    pub hit_ids: HashSet<UnitId>,
}

/// Turn the gun toward `desired` at a capped angular rate along the
/// shortest arc.
pub fn rotate_gun(unit: &mut Unit, desired: f32, dt: f32) {
    let max_step = unit.stats().turn_speed * dt;
    let delta = angle_delta(unit.gun_angle, desired);
    let step = delta.clamp(-max_step, max_step);
    unit.gun_angle = normalize_angle(unit.gun_angle + step);
}

/// Predict where to aim at a moving target: refine flight time and
/// predicted position a fixed number of iterations so lead converges.
#[must_use]
pub fn lead_target(shooter_pos: Vec2, target_pos: Vec2, target_vel: Vec2, speed: f32) -> Vec2 {
    if speed <= 0.0 {
        return target_pos;
    }
    let mut predicted = target_pos;
    for _ in 0..LEAD_ITERATIONS {
        let flight_time = shooter_pos.distance(predicted) / speed;
        predicted = target_pos + target_vel * flight_time;
    }
    predicted
}

/// Firing gate: tick the cooldown and produce a projectile when the
/// cooldown has elapsed and the gun is on target.
///
/// A failed aim check does not reset the cooldown; the unit keeps
/// trying on subsequent ticks.
pub fn try_fire(
    unit: &mut Unit,
    target: &Unit,
    field: &Battlefield,
    bonus_per_zone: f32,
    dt: f32,
) -> Option<Projectile> {
    unit.fire_timer -= dt * 1000.0;
    if unit.fire_timer > 0.0 {
        return None;
    }

    let bearing = (target.pos - unit.pos).angle();
    if angle_delta(unit.gun_angle, bearing).abs() > AIM_TOLERANCE {
        return None;
    }

    let stats = unit.stats();
    unit.fire_timer = stats.fire_cooldown_ms;

    let aim = lead_target(unit.pos, target.pos, target.vel, stats.projectile_speed);
    let mut dir = (aim - unit.pos).normalized();
    if dir == Vec2::ZERO {
        dir = Vec2::from_angle(unit.gun_angle);
    }

    let zones = field.elevation_overlap_count(unit.pos) as f32;
    let max_range = stats.range * (1.0 + bonus_per_zone * zones) + RANGE_GRACE;

    Some(Projectile {
        pos: unit.pos,
        vel: dir * stats.projectile_speed,
        damage: stats.damage,
        radius: stats.projectile_radius,
        team: unit.team,
        max_range,
        distance_traveled: 0.0,
        trail: VecDeque::new(),
        piercing: stats.piercing,
        hit_ids: HashSet::new(),
    })
}

/// Advance all projectiles by `dt` and resolve hits.
///
/// Expired or consumed projectiles are dropped from the collection.
/// Returns one [`HitEvent`] per resolved hit, in deterministic order.
pub fn step_projectiles(
    projectiles: &mut Vec<Projectile>,
    arena: &mut UnitArena,
    field: &Battlefield,
    dt: f32,
) -> Vec<HitEvent> {
    let mut events = Vec::new();
    let unit_ids = arena.sorted_ids();

    projectiles.retain_mut(|proj| {
        let old_pos = proj.pos;
        let step = proj.vel * dt;
        proj.pos += step;
        proj.distance_traveled += step.length();

        proj.trail.push_back(old_pos);
        if proj.trail.len() > TRAIL_LEN {
            proj.trail.pop_front();
        }

        if !field.in_bounds(proj.pos) || proj.distance_traveled > proj.max_range {
            return false;
        }

        // Swept test so fast rounds cannot tunnel through walls.
        if field
            .obstacles
            .iter()
            .any(|o| o.rect.expanded(proj.radius).intersects_segment(old_pos, proj.pos))
        {
            return false;
        }

        for &id in &unit_ids {
            let Some(hit) = check_unit_hit(proj, id, arena, field) else {
                continue;
            };
            events.push(hit);
            if proj.piercing {
                proj.damage *= 0.5;
                proj.hit_ids.insert(id);
            } else {
                return false;
            }
        }

        true
    });

    events
}

/// Resolve a possible hit of `proj` against one unit, applying damage
/// and knockback on contact.
fn check_unit_hit(
    proj: &Projectile,
    id: UnitId,
    arena: &mut UnitArena,
    field: &Battlefield,
) -> Option<HitEvent> {
    {
        let unit = arena.get(id)?;
        if !unit.alive || unit.team == proj.team || proj.hit_ids.contains(&id) {
            return None;
        }
        if !circles_overlap(proj.pos, proj.radius, unit.pos, unit.stats().radius) {
            return None;
        }
    }

    let unit = arena.get_mut(id)?;
    let heading = proj.vel.angle();

    // Incoming direction is the reverse of the projectile heading;
    // outside the target's front cone counts as a flank.
    let incoming = normalize_angle(heading + std::f32::consts::PI);
    let flanked = angle_delta(unit.gun_angle, incoming).abs() > FLANK_ANGLE;

    let raw = proj.damage;
    let applied = if flanked { raw * FLANK_MULTIPLIER } else { raw };

    // Knockback scales with raw damage, along the projectile heading.
    let radius = unit.stats().radius;
    let pushed = unit.pos + proj.vel.normalized() * (raw * KNOCKBACK_PER_DAMAGE);
    unit.pos = field.clamp_to_bounds(pushed, radius);

    let killed = unit.apply_damage(applied);

    Some(HitEvent {
        pos: proj.pos,
        target_id: id,
        team: proj.team,
        killed,
        angle: heading,
        damage: applied,
        flanked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::{MapConfig, Obstacle};
    use crate::math::Rect;
    use crate::units::UnitKind;
    use std::f32::consts::PI;

    fn open_field() -> Battlefield {
        let mut field = Battlefield::generate(&MapConfig::default().with_seed(1));
        field.obstacles.clear();
        field.elevation_zones.clear();
        field
    }

    fn projectile_at(pos: Vec2, vel: Vec2, damage: f32, team: Team, piercing: bool) -> Projectile {
        Projectile {
            pos,
            vel,
            damage,
            radius: 2.0,
            team,
            max_range: 1000.0,
            distance_traveled: 0.0,
            trail: VecDeque::new(),
            piercing,
            hit_ids: HashSet::new(),
        }
    }

    #[test]
    fn test_rotate_gun_clamped_shortest_arc() {
        let mut unit = Unit::new(1, UnitKind::Gunner, Team::Blue, Vec2::ZERO);
        unit.gun_angle = 0.9 * PI;
        rotate_gun(&mut unit, -0.9 * PI, 0.01);
        // Shortest arc crosses the seam upward, never swings back through zero.
        assert!(unit.gun_angle > 0.9 * PI || unit.gun_angle < -0.89 * PI);

        let mut slow = Unit::new(2, UnitKind::Gunner, Team::Blue, Vec2::ZERO);
        rotate_gun(&mut slow, PI, 0.1);
        assert!((slow.gun_angle - 0.35).abs() < 1e-4);
    }

    #[test]
    fn test_cooldown_gates_fire() {
        let field = open_field();
        let mut shooter = Unit::new(1, UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let target = Unit::new(2, UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        shooter.gun_angle = 0.0;
        shooter.fire_timer = 500.0;

        // 100 ms tick: still cooling down.
        assert!(try_fire(&mut shooter, &target, &field, 0.25, 0.1).is_none());
        assert!((shooter.fire_timer - 400.0).abs() < 1e-3);

        shooter.fire_timer = 50.0;
        let shot = try_fire(&mut shooter, &target, &field, 0.25, 0.1);
        assert!(shot.is_some());
        assert_eq!(shooter.fire_timer, shooter.stats().fire_cooldown_ms);
    }

    #[test]
    fn test_bad_aim_skips_shot_without_cooldown_reset() {
        let field = open_field();
        let mut shooter = Unit::new(1, UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let target = Unit::new(2, UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        shooter.gun_angle = PI / 2.0; // way off the 0.0 bearing
        shooter.fire_timer = 0.0;

        assert!(try_fire(&mut shooter, &target, &field, 0.25, 0.1).is_none());
        assert!(shooter.fire_timer <= 0.0, "cooldown must not reset on bad aim");

        shooter.gun_angle = 0.05;
        assert!(try_fire(&mut shooter, &target, &field, 0.25, 0.1).is_some());
    }

    #[test]
    fn test_lead_converges_on_moving_target() {
        let shooter = Vec2::new(0.0, 0.0);
        let target_pos = Vec2::new(100.0, 0.0);
        let target_vel = Vec2::new(0.0, 40.0);
        let speed = 200.0;

        let aim = lead_target(shooter, target_pos, target_vel, speed);
        // Aim point leads in the direction of travel.
        assert!(aim.y > 15.0 && aim.y < 30.0, "lead was {aim:?}");

        let stationary = lead_target(shooter, target_pos, Vec2::ZERO, speed);
        assert_eq!(stationary, target_pos);
    }

    #[test]
    fn test_elevation_extends_projectile_range() {
        let mut field = open_field();
        let mut on_ground = Unit::new(1, UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        let target = Unit::new(2, UnitKind::Rifleman, Team::Red, Vec2::new(150.0, 100.0));
        on_ground.fire_timer = 0.0;
        let flat = try_fire(&mut on_ground, &target, &field, 0.25, 0.016).unwrap();

        field.elevation_zones.push(crate::battlefield::ElevationZone {
            rect: Rect::new(80.0, 80.0, 40.0, 40.0),
        });
        let mut elevated = Unit::new(3, UnitKind::Rifleman, Team::Blue, Vec2::new(100.0, 100.0));
        elevated.fire_timer = 0.0;
        let raised = try_fire(&mut elevated, &target, &field, 0.25, 0.016).unwrap();

        assert!(raised.max_range > flat.max_range);
    }

    #[test]
    fn test_frontal_hit_not_flanked_rear_hit_flanked() {
        let field = open_field();
        let mut arena = UnitArena::new();
        let id = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(100.0, 100.0));
        arena.get_mut(id).unwrap().gun_angle = 0.0; // facing +x

        // Projectile flying -x: incoming direction +x, dead ahead.
        let mut frontal = vec![projectile_at(
            Vec2::new(110.0, 100.0),
            Vec2::new(-200.0, 0.0),
            10.0,
            Team::Blue,
            false,
        )];
        let events = step_projectiles(&mut frontal, &mut arena, &field, 0.016);
        assert_eq!(events.len(), 1);
        assert!(!events[0].flanked);
        assert!((events[0].damage - 10.0).abs() < 1e-5);

        // Projectile flying +x hits the same unit from directly behind.
        let mut rear = vec![projectile_at(
            Vec2::new(90.0, 100.0),
            Vec2::new(200.0, 0.0),
            10.0,
            Team::Blue,
            false,
        )];
        let events = step_projectiles(&mut rear, &mut arena, &field, 0.016);
        assert_eq!(events.len(), 1);
        assert!(events[0].flanked);
        assert!((events[0].damage - 15.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_piercing_consumed_on_first_hit() {
        let field = open_field();
        let mut arena = UnitArena::new();
        arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(100.0, 100.0));
        arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(104.0, 100.0));

        let mut projectiles = vec![projectile_at(
            Vec2::new(98.0, 100.0),
            Vec2::new(200.0, 0.0),
            10.0,
            Team::Blue,
            false,
        )];
        let events = step_projectiles(&mut projectiles, &mut arena, &field, 0.016);
        assert_eq!(events.len(), 1);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_piercing_hits_multiple_with_decreasing_damage() {
        let field = open_field();
        let mut arena = UnitArena::new();
        let first = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(100.0, 100.0));
        let second = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(103.0, 100.0));

        let mut projectiles = vec![projectile_at(
            Vec2::new(98.0, 100.0),
            Vec2::new(200.0, 0.0),
            20.0,
            Team::Blue,
            true,
        )];
        let events = step_projectiles(&mut projectiles, &mut arena, &field, 0.016);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].target_id, first);
        assert_eq!(events[1].target_id, second);
        assert!(events[1].damage < events[0].damage);
        assert_eq!(projectiles.len(), 1, "piercing round keeps flying");
        assert!(projectiles[0].hit_ids.contains(&first));

        // Next tick: no double-hit on units already struck.
        let events = step_projectiles(&mut projectiles, &mut arena, &field, 0.001);
        assert!(events.is_empty());
    }

    #[test]
    fn test_knockback_displaces_along_heading() {
        let field = open_field();
        let mut arena = UnitArena::new();
        let id = arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(100.0, 100.0));

        let mut projectiles = vec![projectile_at(
            Vec2::new(98.0, 100.0),
            Vec2::new(200.0, 0.0),
            25.0,
            Team::Blue,
            false,
        )];
        step_projectiles(&mut projectiles, &mut arena, &field, 0.016);

        let unit = arena.get(id).unwrap();
        assert!((unit.pos.x - 103.0).abs() < 0.5, "knockback was {:?}", unit.pos);
    }

    #[test]
    fn test_projectile_stopped_by_obstacle() {
        let mut field = open_field();
        field.obstacles.push(Obstacle {
            rect: Rect::new(120.0, 80.0, 20.0, 40.0),
        });
        let mut arena = UnitArena::new();
        arena.spawn(UnitKind::Rifleman, Team::Red, Vec2::new(200.0, 100.0));

        let mut projectiles = vec![projectile_at(
            Vec2::new(100.0, 100.0),
            Vec2::new(400.0, 0.0),
            10.0,
            Team::Blue,
            false,
        )];
        // One long tick carries the round through the wall's plane.
        let events = step_projectiles(&mut projectiles, &mut arena, &field, 0.1);
        assert!(events.is_empty());
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_projectile_expires_past_max_range() {
        let field = open_field();
        let mut arena = UnitArena::new();
        let mut proj = projectile_at(
            Vec2::new(100.0, 100.0),
            Vec2::new(200.0, 0.0),
            10.0,
            Team::Blue,
            false,
        );
        proj.max_range = 10.0;
        let mut projectiles = vec![proj];

        step_projectiles(&mut projectiles, &mut arena, &field, 0.1);
        assert!(projectiles.is_empty());
    }
}
