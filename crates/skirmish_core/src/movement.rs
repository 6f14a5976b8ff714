//! Movement and steering.
//!
//! Per-tick displacement toward a unit's move target, blended with
//! avoidance steering around neighbors, obstacle sliding, and a
//! pairwise separation pass. None of this fails: degenerate geometry
//! degrades to "arrived" or "stall for a tick".

use crate::battlefield::{Battlefield, Obstacle};
use crate::math::{circles_overlap, Vec2};
use crate::rng::BattleRng;
use crate::units::{Unit, UnitArena, UnitId};

/// Distance at which a unit snaps onto its target.
pub const ARRIVE_DIST: f32 = 2.0;

/// Neighbor avoidance kicks in within `radius * PROXIMITY_FACTOR`.
const PROXIMITY_FACTOR: f32 = 5.0;

/// Extra clearance added to summed radii for the lateral-steer corridor.
const CORRIDOR_PAD: f32 = 4.0;

/// Blend weights: desired direction, proximity push, lateral steer.
const W_DESIRED: f32 = 1.0;
const W_PROXIMITY: f32 = 1.5;
const W_LATERAL: f32 = 1.0;

/// Separation pass iterations per tick.
const SEPARATION_ITERATIONS: usize = 3;

/// Velocity a unit below which counts as stationary.
pub const STATIONARY_SPEED: f32 = 0.5;

/// Snapshot of a neighboring unit, taken before the movement pass so
/// each unit steers against consistent state.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Unit id (used to skip self).
    pub id: UnitId,
    /// Position at the start of the tick.
    pub pos: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Whether the unit is alive.
    pub alive: bool,
}

/// Collect neighbor snapshots from the arena in sorted-id order.
#[must_use]
pub fn neighbor_snapshot(arena: &UnitArena) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = arena
        .iter()
        .map(|u| Neighbor {
            id: u.id,
            pos: u.pos,
            radius: u.stats().radius,
            alive: u.alive,
        })
        .collect();
    neighbors.sort_unstable_by_key(|n| n.id);
    neighbors
}

/// Promote the next queued waypoint once the current target is reached.
pub fn advance_waypoint(unit: &mut Unit) {
    if let Some(target) = unit.move_target {
        if unit.pos.distance(target) <= ARRIVE_DIST {
            unit.move_target = unit.waypoints.pop_front();
            unit.stuck_time = 0.0;
        }
    }
}

/// Move one unit for `dt` seconds.
///
/// Velocity is derived from actual displacement, not desired speed:
/// projectile lead prediction reads it downstream.
pub fn step_unit(
    unit: &mut Unit,
    dt: f32,
    field: &Battlefield,
    neighbors: &[Neighbor],
    rng: &mut BattleRng,
) {
    if dt <= 0.0 || !unit.alive {
        return;
    }

    let Some(target) = unit.move_target else {
        unit.vel = Vec2::ZERO;
        return;
    };

    let stats = unit.stats();
    let old_pos = unit.pos;
    let to_target = target - unit.pos;
    let dist = to_target.length();

    if dist <= ARRIVE_DIST {
        unit.pos = field.clamp_to_bounds(target, stats.radius);
        unit.vel = Vec2::ZERO;
        return;
    }

    let desired = to_target * (1.0 / dist);
    let mut dir = desired * W_DESIRED
        + proximity_push(unit, stats.radius, neighbors) * W_PROXIMITY
        + lateral_steer(unit, stats.radius, desired, dist, neighbors) * W_LATERAL;
    dir = dir.normalized();
    if dir == Vec2::ZERO {
        dir = desired;
    }

    if stats.wobble > 0.0 {
        unit.wobble_phase += dt * (5.0 + rng.jitter(1.5));
        dir = (dir + dir.perp() * (unit.wobble_phase.sin() * stats.wobble)).normalized();
    }

    let step_len = (stats.speed * dt).min(dist);
    let mut candidate = unit.pos + dir * step_len;

    if collides_obstacles(candidate, stats.radius, &field.obstacles) {
        let slid = slide_along_obstacles(unit.pos, candidate, stats.radius, dir, step_len, field);
        match slid {
            Some(pos) => candidate = pos,
            None => {
                // Fully blocked: corrective push-out, stall for this tick.
                unit.pos =
                    field.clamp_to_bounds(push_out(unit.pos, stats.radius, &field.obstacles), stats.radius);
                unit.vel = Vec2::ZERO;
                unit.stuck_time += dt;
                return;
            }
        }
    }

    candidate = reject_unit_overlap(unit, stats.radius, candidate, neighbors);
    unit.pos = field.clamp_to_bounds(candidate, stats.radius);
    unit.vel = (unit.pos - old_pos) * (1.0 / dt);

    if unit.vel.length() < STATIONARY_SPEED {
        unit.stuck_time += dt;
    } else {
        unit.stuck_time = 0.0;
    }
}

/// Push away from any live neighbor within `radius * PROXIMITY_FACTOR`,
/// scaled by closeness and strongest when centers nearly coincide.
fn proximity_push(unit: &Unit, radius: f32, neighbors: &[Neighbor]) -> Vec2 {
    let reach = radius * PROXIMITY_FACTOR;
    let mut push = Vec2::ZERO;

    for n in neighbors {
        if n.id == unit.id || !n.alive {
            continue;
        }
        let away = unit.pos - n.pos;
        let d = away.length();
        if d >= reach {
            continue;
        }
        if d < 1e-3 {
            // Coincident centers: deterministic sideways shove.
            push += Vec2::from_angle(unit.id as f32);
        } else {
            push += away * (1.0 / d) * (1.0 - d / reach);
        }
    }

    push
}

/// Steer sideways away from neighbors projected ahead of the unit and
/// inside the minimum separation corridor.
fn lateral_steer(
    unit: &Unit,
    radius: f32,
    desired: Vec2,
    dist_to_target: f32,
    neighbors: &[Neighbor],
) -> Vec2 {
    let lookahead = dist_to_target.min(radius * PROXIMITY_FACTOR * 2.0);
    let mut steer = Vec2::ZERO;

    for n in neighbors {
        if n.id == unit.id || !n.alive {
            continue;
        }
        let rel = n.pos - unit.pos;
        let ahead = rel.dot(desired);
        if ahead <= 0.0 || ahead >= lookahead {
            continue;
        }
        let corridor = radius + n.radius + CORRIDOR_PAD;
        let lateral = rel - desired * ahead;
        let off = lateral.length();
        if off >= corridor {
            continue;
        }
        let side = if desired.perp().dot(rel) > 0.0 { -1.0 } else { 1.0 };
        steer += desired.perp() * (side * (1.0 - off / corridor));
    }

    steer
}

/// Attempt axis-only moves, then a half-step diagonal, when the full
/// step would enter an obstacle. Returns `None` if everything fails.
fn slide_along_obstacles(
    from: Vec2,
    blocked: Vec2,
    radius: f32,
    dir: Vec2,
    step_len: f32,
    field: &Battlefield,
) -> Option<Vec2> {
    let horizontal = Vec2::new(blocked.x, from.y);
    if !collides_obstacles(horizontal, radius, &field.obstacles) {
        return Some(horizontal);
    }
    let vertical = Vec2::new(from.x, blocked.y);
    if !collides_obstacles(vertical, radius, &field.obstacles) {
        return Some(vertical);
    }
    let half = from + dir * (step_len * 0.5);
    if !collides_obstacles(half, radius, &field.obstacles) {
        return Some(half);
    }
    None
}

/// Reject a candidate that would overlap another live unit's circle,
/// trying each axis separately before falling back to "stay put".
fn reject_unit_overlap(unit: &Unit, radius: f32, candidate: Vec2, neighbors: &[Neighbor]) -> Vec2 {
    let overlaps = |p: Vec2| {
        neighbors
            .iter()
            .any(|n| n.id != unit.id && n.alive && circles_overlap(p, radius, n.pos, n.radius))
    };

    if !overlaps(candidate) {
        return candidate;
    }
    let horizontal = Vec2::new(candidate.x, unit.pos.y);
    if !overlaps(horizontal) {
        return horizontal;
    }
    let vertical = Vec2::new(unit.pos.x, candidate.y);
    if !overlaps(vertical) {
        return vertical;
    }
    unit.pos
}

/// Whether a circle at `pos` overlaps any obstacle.
#[must_use]
pub fn collides_obstacles(pos: Vec2, radius: f32, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| o.rect.intersects_circle(pos, radius))
}

/// Push a circle out of every obstacle it overlaps, along the shortest
/// axis per obstacle.
#[must_use]
pub fn push_out(mut pos: Vec2, radius: f32, obstacles: &[Obstacle]) -> Vec2 {
    for o in obstacles {
        if !o.rect.intersects_circle(pos, radius) {
            continue;
        }
        let r = o.rect;
        let left = (pos.x + radius) - r.x;
        let right = (r.x + r.w) - (pos.x - radius);
        let up = (pos.y + radius) - r.y;
        let down = (r.y + r.h) - (pos.y - radius);

        let min = left.min(right).min(up).min(down);
        if min == left {
            pos.x = r.x - radius;
        } else if min == right {
            pos.x = r.x + r.w + radius;
        } else if min == up {
            pos.y = r.y - radius;
        } else {
            pos.y = r.y + r.h + radius;
        }
    }
    pos
}

/// Pairwise separation pass, run once per tick.
///
/// Several iterations push overlapping live units apart along their
/// center-to-center axis, apply a soft velocity bounce to converging
/// pairs (stronger between same-team units to discourage friendly
/// stacking), then re-clamp to bounds and push everyone out of any
/// obstacle they still overlap.
pub fn separation_pass(arena: &mut UnitArena, field: &Battlefield) {
    let ids = arena.sorted_ids();

    for _ in 0..SEPARATION_ITERATIONS {
        for (i, &a_id) in ids.iter().enumerate() {
            for &b_id in &ids[i + 1..] {
                let Some((a_pos, a_vel, a_radius, a_team, a_alive)) = arena
                    .get(a_id)
                    .map(|u| (u.pos, u.vel, u.stats().radius, u.team, u.alive))
                else {
                    continue;
                };
                let Some((b_pos, b_vel, b_radius, b_team, b_alive)) = arena
                    .get(b_id)
                    .map(|u| (u.pos, u.vel, u.stats().radius, u.team, u.alive))
                else {
                    continue;
                };
                if !a_alive || !b_alive {
                    continue;
                }

                let min_dist = a_radius + b_radius;
                let axis = b_pos - a_pos;
                let d = axis.length();
                if d >= min_dist {
                    continue;
                }

                let dir = if d < 1e-3 {
                    Vec2::from_angle(a_id as f32 + b_id as f32)
                } else {
                    axis * (1.0 / d)
                };
                let overlap = min_dist - d;
                let shift = dir * (overlap * 0.5);

                let converging = (b_vel - a_vel).dot(dir) < 0.0;
                let bounce = if converging {
                    let factor = if a_team == b_team { 0.45 } else { 0.3 };
                    dir * (overlap * factor)
                } else {
                    Vec2::ZERO
                };

                if let Some(a) = arena.get_mut(a_id) {
                    a.pos = field.clamp_to_bounds(a.pos - shift, a_radius);
                    a.vel = a.vel - bounce;
                }
                if let Some(b) = arena.get_mut(b_id) {
                    b.pos = field.clamp_to_bounds(b.pos + shift, b_radius);
                    b.vel = b.vel + bounce;
                }
            }
        }
    }

    // Final pass: nobody ends the tick inside an obstacle.
    for &id in &ids {
        if let Some(unit) = arena.get_mut(id) {
            let radius = unit.stats().radius;
            let pushed = push_out(unit.pos, radius, &field.obstacles);
            unit.pos = field.clamp_to_bounds(pushed, radius);
        }
    }
}
