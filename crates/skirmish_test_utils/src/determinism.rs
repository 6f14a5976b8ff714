//! Determinism testing utilities.
//!
//! Harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Battles must be reproducible so scenarios and regressions can be
//! replayed exactly. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The arena always iterates in sorted unit-id order.
//!
//! - **System randomness**: no unseeded `rand()` anywhere. Spawn
//!   jitter, wobble and map layout all flow from one seeded source.
//!
//! - **Tick cadence**: the pipeline is a function of `(state, dt)`, so
//!   identical delta sequences must yield identical states.
//!
//! Floating-point state is compared bit-exactly via
//! [`skirmish_core::battle::Battle::state_hash`]; this asserts
//! same-machine reproducibility, which is what replay needs.

use std::thread;

use skirmish_core::battle::Battle;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the runs matched, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and compare final hashes.
///
/// * `runs` - number of repetitions
/// * `ticks` - ticks per repetition
/// * `setup` - builds the initial state
/// * `step` - advances one tick
/// * `hash` - digests the state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified two-run check for a [`Battle`] ticked at a fixed cadence.
///
/// The setup function must fully configure the battle, including any
/// orders and phase transitions, so both runs start identically.
pub fn verify_battle_determinism<F>(setup_fn: F, ticks: u64, delta_ms: f32) -> bool
where
    F: Fn() -> Battle,
{
    let result = verify_determinism(
        2,
        ticks,
        &setup_fn,
        |battle| {
            battle.tick(delta_ms);
        },
        Battle::state_hash,
    );
    result.is_deterministic
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// `None` if the runs never diverge, `Some(tick)` otherwise. Useful
/// for bisecting a non-determinism bug to the tick that introduced it.
pub fn find_first_divergence<F>(setup_fn: F, ticks: u64, delta_ms: f32) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        a.tick(delta_ms);
        b.tick(delta_ms);
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Run N battles in parallel with scoped threads and compare hashes.
///
/// Catches non-determinism that only shows up under scheduling or
/// memory-layout variation.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize, ticks: u64, delta_ms: f32) -> Vec<u64>
where
    F: Fn() -> Battle + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    for _ in 0..ticks {
                        battle.tick(delta_ms);
                    }
                    battle.state_hash()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::math::Vec2;
    use skirmish_core::units::UnitKind;

    /// A position inside the default 480x360 map.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (0.0f32..480.0, 0.0f32..360.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// A position that may fall well outside map bounds.
    pub fn arb_wild_position() -> impl Strategy<Value = Vec2> {
        (-600.0f32..1100.0, -600.0f32..900.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Rifleman),
            Just(UnitKind::Scout),
            Just(UnitKind::Sniper),
            Just(UnitKind::Gunner),
        ]
    }

    /// A squad of 1 to `max` units.
    pub fn arb_squad(max: usize) -> impl Strategy<Value = Vec<UnitKind>> {
        proptest::collection::vec(arb_unit_kind(), 1..max)
    }

    /// A raw waypoint list (possibly out of bounds, engine must clamp).
    pub fn arb_waypoints(max_len: usize) -> impl Strategy<Value = Vec<Vec2>> {
        proptest::collection::vec(arb_wild_position(), 0..max_len)
    }

    /// A damage amount, including the negative values the engine must
    /// ignore.
    pub fn arb_damage() -> impl Strategy<Value = f32> {
        -50.0f32..400.0
    }
}
