//! Scenario loading and presets.
//!
//! Scenarios define the initial battle setup for headless runs: the
//! squads on each side and the battle tuning knobs. Stored as JSON so
//! batch tooling can generate them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::battle::{Battle, BattleConfig};
use skirmish_core::units::UnitKind;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("failed to read scenario file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse JSON.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Blue's squad.
    pub blue: Vec<UnitKind>,
    /// Red's squad (respawned per wave in wave mode).
    pub red: Vec<UnitKind>,
    /// Maximum execution time per round, milliseconds.
    pub round_duration_ms: f32,
    /// Idle debounce before a round ends early, milliseconds.
    pub idle_completion_ms: f32,
    /// Whether the zone-control win condition is active.
    pub zone_control: bool,
    /// Number of red waves.
    pub waves: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Parse from a JSON string (useful for embedded scenarios).
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve a name to a preset, falling back to loading it as a path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match name {
            "duel" => Ok(Self::duel()),
            "squad_clash" => Ok(Self::squad_clash()),
            "sniper_hill" => Ok(Self::sniper_hill()),
            path => Self::load(path),
        }
    }

    /// Minimal 1v1: two riflemen, open approach.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "Duel".to_string(),
            description: "Single rifleman per side".to_string(),
            blue: vec![UnitKind::Rifleman],
            red: vec![UnitKind::Rifleman],
            round_duration_ms: 20_000.0,
            idle_completion_ms: 1_500.0,
            zone_control: false,
            waves: 1,
        }
    }

    /// Mixed five-unit squads, the standard balance matchup.
    #[must_use]
    pub fn squad_clash() -> Self {
        let squad = vec![
            UnitKind::Rifleman,
            UnitKind::Rifleman,
            UnitKind::Scout,
            UnitKind::Sniper,
            UnitKind::Gunner,
        ];
        Self {
            name: "Squad Clash".to_string(),
            description: "Mixed squads, mirrored map".to_string(),
            blue: squad.clone(),
            red: squad,
            round_duration_ms: 20_000.0,
            idle_completion_ms: 1_500.0,
            zone_control: false,
            waves: 1,
        }
    }

    /// Sniper-heavy red defense against a rushing blue squad.
    #[must_use]
    pub fn sniper_hill() -> Self {
        Self {
            name: "Sniper Hill".to_string(),
            description: "Blue rush versus entrenched snipers".to_string(),
            blue: vec![
                UnitKind::Scout,
                UnitKind::Scout,
                UnitKind::Rifleman,
                UnitKind::Rifleman,
            ],
            red: vec![UnitKind::Sniper, UnitKind::Sniper, UnitKind::Gunner],
            round_duration_ms: 20_000.0,
            idle_completion_ms: 1_500.0,
            zone_control: false,
            waves: 1,
        }
    }

    /// Battle config for this scenario at the given seed.
    #[must_use]
    pub fn battle_config(&self, seed: u64) -> BattleConfig {
        BattleConfig::default()
            .with_seed(seed)
            .with_round_duration_ms(self.round_duration_ms)
            .with_idle_completion_ms(self.idle_completion_ms)
            .with_zone_control(self.zone_control)
            .with_waves(self.waves)
    }

    /// Create and start a battle for this scenario.
    pub fn start_battle(&self, seed: u64) -> skirmish_core::error::Result<Battle> {
        let mut battle = Battle::new(self.battle_config(seed));
        battle.start(&self.blue, &self.red)?;
        Ok(battle)
    }
}
