//! Drives a battle from start to outcome.
//!
//! The runner owns the phase loop: it lets the scripted commander plan
//! for each side, confirms the plans, skips the cover interlude, and
//! ticks the execution phase at a fixed cadence until the battle ends
//! or a round cap is hit.

use thiserror::Error;
use tracing::{debug, info};

use skirmish_core::battle::{Battle, TurnPhase};
use skirmish_core::error::BattleError;
use skirmish_core::events::{BattleEvent, WinCondition};
use skirmish_core::units::Team;

use crate::commander;
use crate::render::{render_ascii, RenderConfig};
use crate::scenario::Scenario;

/// Runner errors.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The engine rejected a lifecycle call.
    #[error("engine error: {0}")]
    Engine(#[from] BattleError),
    /// The battle never concluded within the tick budget.
    #[error("battle stalled after {ticks} ticks")]
    Stalled {
        /// Ticks executed before giving up.
        ticks: u64,
    },
}

/// Options for a single headless run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Battle seed.
    pub seed: u64,
    /// Tick delta in milliseconds.
    pub delta_ms: f32,
    /// Simulation speed multiplier.
    pub speed: f32,
    /// Rounds before the battle is called a draw.
    pub max_rounds: u32,
    /// Print an ASCII frame to stderr periodically.
    pub render: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: 12345,
            delta_ms: 16.0,
            speed: 4.0,
            max_rounds: 20,
            render: false,
        }
    }
}

/// Outcome of one headless battle.
#[derive(Debug, Clone, Copy)]
pub struct BattleOutcome {
    /// Winning side, `None` for a draw or mutual destruction.
    pub winner: Option<Team>,
    /// Win condition, `None` when the round cap forced a draw.
    pub condition: Option<WinCondition>,
    /// Rounds played.
    pub rounds: u32,
    /// Waves survived.
    pub waves: u32,
    /// Battle duration in milliseconds of real driver time.
    pub duration_ms: f32,
    /// Blue survivors.
    pub blue_survivors: usize,
    /// Red survivors.
    pub red_survivors: usize,
    /// State hash at the end, for determinism checks.
    pub final_hash: u64,
}

/// Ticks before the runner declares the battle stalled. Generous:
/// max_rounds * round_duration at the slowest speed fits well inside.
const MAX_TICKS: u64 = 500_000;

/// Run one battle to completion.
pub fn run_battle(scenario: &Scenario, options: &RunOptions) -> Result<BattleOutcome, RunnerError> {
    let mut battle = scenario.start_battle(options.seed)?;
    battle.set_speed(options.speed);
    info!(scenario = %scenario.name, seed = options.seed, "battle run started");

    let mut report = None;
    let mut ticks: u64 = 0;

    while battle.is_running() && report.is_none() {
        match battle.phase() {
            TurnPhase::BluePlanning => {
                commander::issue_orders(&mut battle, Team::Blue);
                battle.confirm_plan()?;
            }
            TurnPhase::Cover => {
                battle.skip_cover()?;
            }
            TurnPhase::RedPlanning => {
                commander::issue_orders(&mut battle, Team::Red);
                battle.confirm_plan()?;
            }
            TurnPhase::Playing => {
                ticks += 1;
                if ticks > MAX_TICKS {
                    return Err(RunnerError::Stalled { ticks });
                }
                for event in battle.tick(options.delta_ms) {
                    match event {
                        BattleEvent::Ended(r) => report = Some(r),
                        BattleEvent::WaveClear => {
                            debug!(wave = battle.wave(), "wave cleared, spawning next");
                            battle.spawn_wave(&scenario.red)?;
                        }
                        _ => {}
                    }
                }
                if options.render && ticks % 60 == 0 {
                    eprintln!("{}", render_ascii(&battle, &RenderConfig::default()));
                }
            }
        }

        if battle.round() > options.max_rounds {
            break;
        }
    }

    let final_hash = battle.state_hash();
    let outcome = match report {
        Some(r) => BattleOutcome {
            winner: r.winner,
            condition: Some(r.condition),
            rounds: battle.round(),
            waves: battle.wave(),
            duration_ms: r.duration_ms,
            blue_survivors: r.blue_survivors,
            red_survivors: r.red_survivors,
            final_hash,
        },
        None => {
            // Round cap: call it a draw.
            let blue_survivors = battle.alive_count(Team::Blue);
            let red_survivors = battle.alive_count(Team::Red);
            battle.stop();
            BattleOutcome {
                winner: None,
                condition: None,
                rounds: options.max_rounds,
                waves: battle.wave(),
                duration_ms: ticks as f32 * options.delta_ms,
                blue_survivors,
                red_survivors,
                final_hash,
            }
        }
    };

    info!(winner = ?outcome.winner, rounds = outcome.rounds, "battle run finished");
    Ok(outcome)
}

/// Run the same scenario/seed several times and compare final hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    options: &RunOptions,
    runs: u32,
) -> Result<bool, RunnerError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        hashes.push(run_battle(scenario, options)?.final_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
