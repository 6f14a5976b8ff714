//! Battle fixtures.
//!
//! Pre-built configurations and ready-to-tick battles for consistent
//! testing across crates.

use skirmish_core::battle::{Battle, BattleConfig};
use skirmish_core::battlefield::{Battlefield, MapConfig, SymmetryMode};
use skirmish_core::units::UnitKind;

/// A small, fast battle config: short rounds, tight idle debounce, no
/// zone control. Seeded so fixtures reproduce exactly.
#[must_use]
pub fn quick_config(seed: u64) -> BattleConfig {
    BattleConfig::default()
        .with_seed(seed)
        .with_round_duration_ms(6_000.0)
        .with_idle_completion_ms(500.0)
}

/// A battlefield with no obstacles or elevation, for geometry-free
/// combat and movement tests.
#[must_use]
pub fn open_battlefield(seed: u64) -> Battlefield {
    let mut field = Battlefield::generate(
        &MapConfig::default()
            .with_seed(seed)
            .with_symmetry(SymmetryMode::None)
            .with_obstacle_count(0),
    );
    field.elevation_zones.clear();
    field
}

/// A started 1v1 rifleman battle, still in blue planning.
///
/// # Panics
///
/// Panics if the battle fails to start (fixture misuse).
#[must_use]
pub fn one_v_one(seed: u64) -> Battle {
    let mut battle = Battle::new(quick_config(seed));
    battle
        .start(&[UnitKind::Rifleman], &[UnitKind::Rifleman])
        .expect("fixture battle should start");
    battle
}

/// A started battle with a mixed squad per side, still in blue planning.
///
/// # Panics
///
/// Panics if the battle fails to start (fixture misuse).
#[must_use]
pub fn squad_battle(seed: u64) -> Battle {
    let squad = [
        UnitKind::Rifleman,
        UnitKind::Rifleman,
        UnitKind::Scout,
        UnitKind::Sniper,
        UnitKind::Gunner,
    ];
    let mut battle = Battle::new(quick_config(seed));
    battle
        .start(&squad, &squad)
        .expect("fixture battle should start");
    battle
}

/// Drive a started battle through planning into the execution phase.
///
/// # Panics
///
/// Panics if the battle is not in blue planning (fixture misuse).
pub fn enter_playing(battle: &mut Battle) {
    battle.confirm_plan().expect("blue confirm");
    battle.skip_cover().expect("skip cover");
    battle.confirm_plan().expect("red confirm");
}
