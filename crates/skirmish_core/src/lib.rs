//! # Skirmish Core
//!
//! Deterministic tactical skirmish simulation.
//!
//! Two opposing forces of typed units alternate between planning phases
//! (issuing movement waypoints) and a synchronized execution phase in
//! which everyone moves, steers around obstacles and each other,
//! acquires targets by line of sight, and trades simulated projectiles
//! with travel time, lead prediction, flanking, piercing and knockback.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (all randomness flows from a seeded source)
//!
//! An external driver calls [`battle::Battle::tick`] once per frame and
//! consumes the returned [`events::BattleEvent`]s; orders come in
//! through the battle's lifecycle and order methods.
//!
//! ## Crate Structure
//!
//! - [`battle`] - Turn-phase state machine and tick pipeline
//! - [`battlefield`] - Seeded obstacle/elevation generation
//! - [`combat`] - Firing, projectiles, hit resolution
//! - [`movement`] - Steering, sliding, separation
//! - [`pathing`] - Obstacle-detour route planning
//! - [`targeting`] - Visibility and target selection
//! - [`units`] - Unit records and arena storage
//! - [`math`] - 2D vector and rectangle primitives

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod battlefield;
pub mod combat;
pub mod error;
pub mod events;
pub mod math;
pub mod movement;
pub mod pathing;
pub mod rng;
pub mod targeting;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{Battle, BattleConfig, TurnPhase};
    pub use crate::battlefield::{Battlefield, ElevationZone, MapConfig, Obstacle, SymmetryMode};
    pub use crate::combat::Projectile;
    pub use crate::error::{BattleError, Result};
    pub use crate::events::{BattleEvent, BattleReport, HitEvent, WinCondition};
    pub use crate::math::{Rect, Vec2};
    pub use crate::rng::BattleRng;
    pub use crate::units::{Team, Unit, UnitArena, UnitId, UnitKind, UnitStats};
}
