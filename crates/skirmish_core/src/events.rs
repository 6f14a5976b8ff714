//! Events emitted by the battle, one tagged variant per kind.
//!
//! Consumed asynchronously by the orchestrating UI/AI layer; each
//! variant carries only the fields relevant to that kind.

use serde::{Deserialize, Serialize};

use crate::battle::TurnPhase;
use crate::math::Vec2;
use crate::units::{Team, UnitId};

/// A resolved projectile hit, for the external effects/audio collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// Impact position.
    pub pos: Vec2,
    /// Unit that was struck.
    pub target_id: UnitId,
    /// Team that fired the projectile.
    pub team: Team,
    /// Whether this hit killed the target.
    pub killed: bool,
    /// Projectile heading at impact, radians.
    pub angle: f32,
    /// Damage actually applied (after flank multiplier).
    pub damage: f32,
    /// Whether the hit landed outside the target's front cone.
    pub flanked: bool,
}

/// How a battle concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinCondition {
    /// One side lost every unit.
    Elimination,
    /// A side held the opposing spawn zone uncontested for a full round.
    ZoneControl,
}

/// Final battle report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Winning side, `None` on mutual destruction.
    pub winner: Option<Team>,
    /// Blue units still alive.
    pub blue_survivors: usize,
    /// Red units still alive.
    pub red_survivors: usize,
    /// Kills credited to blue.
    pub blue_kills: usize,
    /// Kills credited to red.
    pub red_kills: usize,
    /// Wall-clock battle duration in milliseconds.
    pub duration_ms: f32,
    /// The condition that ended the battle.
    pub condition: WinCondition,
}

/// Closed set of battle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// Per-tick status for HUDs.
    Update {
        /// Living blue units.
        blue_alive: usize,
        /// Living red units.
        red_alive: usize,
        /// Milliseconds left in the current round.
        remaining_round_ms: f32,
    },
    /// The turn phase changed.
    PhaseChange {
        /// The phase just entered.
        phase: TurnPhase,
        /// Current round number (1-based).
        round: u32,
    },
    /// A shot was actually fired.
    MuzzleFlash {
        /// Firing unit.
        unit_id: UnitId,
        /// Muzzle position.
        pos: Vec2,
        /// Firing angle, radians.
        angle: f32,
    },
    /// A projectile struck a unit.
    Hit(HitEvent),
    /// All enemies eliminated before the final wave; the progression
    /// collaborator must snapshot survivors before reacting.
    WaveClear,
    /// The battle concluded.
    Ended(BattleReport),
}
