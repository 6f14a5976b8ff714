//! Error types for the skirmish engine.

use thiserror::Error;

use crate::units::UnitId;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Errors surfaced by battle lifecycle operations.
///
/// The tick pipeline itself never errors: geometric edge cases degrade
/// to safe fallbacks and malformed orders are clamped. These variants
/// only appear when a caller misuses the lifecycle API.
#[derive(Debug, Error)]
pub enum BattleError {
    /// Order or query referenced a unit that does not exist.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Lifecycle operation called in the wrong phase or before start.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
