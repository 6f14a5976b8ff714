//! Unit records and arena storage.
//!
//! Units live in a [`UnitArena`] addressed by stable ids; all mutation
//! during a tick goes through arena accessors so the movement, combat
//! and cleanup passes never alias each other's borrows. Iteration uses
//! sorted ids for deterministic processing order.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::math::Vec2;
use crate::rng::BattleRng;

/// Unique identifier for units.
pub type UnitId = u32;

/// The two opposing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// The side that plans first.
    Blue,
    /// The side that plans second.
    Red,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }
}

/// Unit type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Baseline line infantry.
    Rifleman,
    /// Fast, erratic mover with a short-range carbine.
    Scout,
    /// Long-range marksman; rounds pierce through targets.
    Sniper,
    /// Slow heavy gunner with a high rate of fire.
    Gunner,
}

/// Static combat and locomotion stats for a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub max_hp: f32,
    /// Damage per projectile before modifiers.
    pub damage: f32,
    /// Base weapon range in map units.
    pub range: f32,
    /// Collision radius.
    pub radius: f32,
    /// Movement speed in map units per second.
    pub speed: f32,
    /// Gun rotation rate in radians per second.
    pub turn_speed: f32,
    /// Time between shots in milliseconds.
    pub fire_cooldown_ms: f32,
    /// Projectile travel speed in map units per second.
    pub projectile_speed: f32,
    /// Projectile collision radius.
    pub projectile_radius: f32,
    /// Whether projectiles pierce through targets.
    pub piercing: bool,
    /// Perpendicular wobble amplitude layered onto locomotion (0 = none).
    pub wobble: f32,
}

impl UnitKind {
    /// Stat table for this kind.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            Self::Rifleman => UnitStats {
                max_hp: 100.0,
                damage: 12.0,
                range: 110.0,
                radius: 7.0,
                speed: 38.0,
                turn_speed: 6.0,
                fire_cooldown_ms: 900.0,
                projectile_speed: 260.0,
                projectile_radius: 2.0,
                piercing: false,
                wobble: 0.0,
            },
            Self::Scout => UnitStats {
                max_hp: 70.0,
                damage: 8.0,
                range: 80.0,
                radius: 6.0,
                speed: 55.0,
                turn_speed: 8.0,
                fire_cooldown_ms: 600.0,
                projectile_speed: 240.0,
                projectile_radius: 1.5,
                piercing: false,
                wobble: 0.55,
            },
            Self::Sniper => UnitStats {
                max_hp: 80.0,
                damage: 30.0,
                range: 190.0,
                radius: 7.0,
                speed: 30.0,
                turn_speed: 4.5,
                fire_cooldown_ms: 2200.0,
                projectile_speed: 340.0,
                projectile_radius: 1.5,
                piercing: true,
                wobble: 0.0,
            },
            Self::Gunner => UnitStats {
                max_hp: 150.0,
                damage: 9.0,
                range: 95.0,
                radius: 9.0,
                speed: 26.0,
                turn_speed: 3.5,
                fire_cooldown_ms: 350.0,
                projectile_speed: 250.0,
                projectile_radius: 2.5,
                piercing: false,
                wobble: 0.0,
            },
        }
    }
}

/// A combat unit.
///
/// Invariants: `alive == (hp > 0.0)`, `hp` stays in `[0, max_hp]`, and
/// once `alive` turns false it never reverts. Enforced by
/// [`Unit::apply_damage`]; nothing else writes `hp` or `alive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Type of unit.
    pub kind: UnitKind,
    /// Owning side.
    pub team: Team,
    /// Current position.
    pub pos: Vec2,
    /// Velocity derived from actual displacement last tick.
    pub vel: Vec2,
    /// Gun facing in radians, normalized to (-pi, pi].
    pub gun_angle: f32,
    /// Current hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Whether the unit is still in the fight.
    pub alive: bool,
    /// Milliseconds until the next shot is allowed.
    pub fire_timer: f32,
    /// Current movement target, if any.
    pub move_target: Option<Vec2>,
    /// Waypoints queued after the current target.
    pub waypoints: VecDeque<Vec2>,
    /// Preferred enemy to attack, if ordered.
    pub attack_target_id: Option<UnitId>,
    /// Seconds spent making no progress toward the target.
    pub stuck_time: f32,
    /// Per-unit wobble phase so scouts don't oscillate in lockstep.
    pub wobble_phase: f32,
}

impl Unit {
    /// Create a living unit of `kind` at `pos`.
    #[must_use]
    pub fn new(id: UnitId, kind: UnitKind, team: Team, pos: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            team,
            pos,
            vel: Vec2::ZERO,
            gun_angle: match team {
                Team::Blue => 0.0,
                Team::Red => std::f32::consts::PI,
            },
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            alive: true,
            fire_timer: 0.0,
            move_target: None,
            waypoints: VecDeque::new(),
            attack_target_id: None,
            stuck_time: 0.0,
            wobble_phase: 0.0,
        }
    }

    /// Static stats for this unit's kind.
    #[must_use]
    pub fn stats(&self) -> UnitStats {
        self.kind.stats()
    }

    /// Apply damage, clamping hp to `[0, max_hp]`.
    ///
    /// Returns `true` if this damage killed the unit. The `alive` flag
    /// flips at most once; damage to a dead unit is ignored.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = (self.hp - amount.max(0.0)).clamp(0.0, self.max_hp);
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.alive = false;
            true
        } else {
            false
        }
    }

    /// Replace the whole movement plan with the given polyline.
    ///
    /// The first point becomes the active target, the rest queue up.
    /// An empty polyline clears the plan.
    pub fn set_route(&mut self, points: Vec<Vec2>) {
        let mut iter = points.into_iter();
        self.move_target = iter.next();
        self.waypoints = iter.collect();
        self.stuck_time = 0.0;
    }

    /// Whether the unit has no target and no queued waypoints.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.move_target.is_none() && self.waypoints.is_empty()
    }
}

/// Storage for all units in a battle.
///
/// `HashMap` for O(1) lookup, with deterministic iteration through
/// [`UnitArena::sorted_ids`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitArena {
    units: HashMap<UnitId, Unit>,
    next_id: UnitId,
}

impl UnitArena {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            next_id: 1,
        }
    }

    /// Spawn a unit, assigning it the next id.
    pub fn spawn(&mut self, kind: UnitKind, team: Team, pos: Vec2) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, kind, team, pos));
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Number of units (living or dead).
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the arena holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Count living units on a team.
    #[must_use]
    pub fn alive_count(&self, team: Team) -> usize {
        self.units
            .values()
            .filter(|u| u.alive && u.team == team)
            .count()
    }

    /// Remove all units (between waves).
    pub fn clear(&mut self) {
        self.units.clear();
    }
}

/// Spawn an army inside its battlefield spawn zone.
///
/// Units are laid out in loose files with a little jitter so they do
/// not start exactly stacked; positions are clamped to stay inside the
/// zone.
pub fn spawn_army(
    arena: &mut UnitArena,
    field: &Battlefield,
    team: Team,
    kinds: &[UnitKind],
    rng: &mut BattleRng,
) -> Vec<UnitId> {
    let zone = field.spawn_zone(team);
    let mut ids = Vec::with_capacity(kinds.len());

    let per_column = 4;
    for (i, &kind) in kinds.iter().enumerate() {
        let col = (i / per_column) as f32;
        let row = (i % per_column) as f32;
        let stats = kind.stats();
        let x = zone.x + stats.radius + col * 22.0 + rng.jitter(3.0);
        let y = zone.y + stats.radius + 20.0 + row * 26.0 + rng.jitter(3.0);
        let pos = Vec2::new(
            x.clamp(zone.x + stats.radius, zone.x + zone.w - stats.radius),
            y.clamp(zone.y + stats.radius, zone.y + zone.h - stats.radius),
        );
        let id = arena.spawn(kind, team, pos);
        if let Some(unit) = arena.get_mut(id) {
            unit.wobble_phase = rng.range(0.0, std::f32::consts::TAU);
        }
        ids.push(id);
    }

    ids
}
