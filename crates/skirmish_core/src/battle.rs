//! Battle orchestration: the turn-phase state machine and the per-tick
//! simulation pipeline.
//!
//! A [`Battle`] owns all units, projectiles and the battlefield for its
//! lifetime. Exactly one external driver calls [`Battle::tick`] with an
//! elapsed-time delta; everything else is passive. Phase transitions
//! are modelled as monotonic deadlines checked inside the tick rather
//! than out-of-band timers, so skipping a phase never has to cancel a
//! callback.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::battlefield::{Battlefield, MapConfig};
use crate::combat::{self, Projectile};
use crate::error::{BattleError, Result};
use crate::events::{BattleEvent, BattleReport, WinCondition};
use crate::math::Vec2;
use crate::movement::{self, STATIONARY_SPEED};
use crate::pathing;
use crate::rng::BattleRng;
use crate::targeting;
use crate::units::{spawn_army, Team, UnitArena, UnitId, UnitKind};

/// Control state of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    /// Blue issues orders.
    BluePlanning,
    /// Brief screen-cover interlude hiding blue's plan from red.
    Cover,
    /// Red issues orders.
    RedPlanning,
    /// Both plans execute simultaneously.
    Playing,
}

/// Battle tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Battlefield generation settings.
    pub map: MapConfig,
    /// Maximum execution time per round, milliseconds.
    pub round_duration_ms: f32,
    /// Duration of the cover interlude, milliseconds.
    pub cover_duration_ms: f32,
    /// Sustained-idle time before a round ends early, milliseconds.
    pub idle_completion_ms: f32,
    /// Terminal delay after an elimination before the end report fires.
    pub elimination_grace_ms: f32,
    /// Additive range bonus per overlapping elevation zone.
    pub elevation_range_bonus: f32,
    /// Whether holding the opposing spawn zone for a full round wins.
    pub zone_control: bool,
    /// Number of red waves before elimination is terminal.
    pub total_waves: u32,
    /// Random seed for the battle's own randomness (wobble, spawn jitter).
    pub seed: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            round_duration_ms: 20_000.0,
            cover_duration_ms: 1_200.0,
            idle_completion_ms: 1_500.0,
            elimination_grace_ms: 900.0,
            elevation_range_bonus: 0.25,
            zone_control: false,
            total_waves: 1,
            seed: 12345,
        }
    }
}

impl BattleConfig {
    /// Set the seed used for both map generation and battle randomness.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.map.seed = seed;
        self
    }

    /// Enable the zone-control win condition.
    #[must_use]
    pub const fn with_zone_control(mut self, enabled: bool) -> Self {
        self.zone_control = enabled;
        self
    }

    /// Set the number of red waves.
    #[must_use]
    pub const fn with_waves(mut self, waves: u32) -> Self {
        self.total_waves = waves;
        self
    }

    /// Set the round duration in milliseconds.
    #[must_use]
    pub const fn with_round_duration_ms(mut self, ms: f32) -> Self {
        self.round_duration_ms = ms;
        self
    }

    /// Set the idle-completion debounce in milliseconds.
    #[must_use]
    pub const fn with_idle_completion_ms(mut self, ms: f32) -> Self {
        self.idle_completion_ms = ms;
        self
    }
}

/// A pending elimination outcome waiting out the terminal delay.
#[derive(Debug, Clone)]
struct PendingEnd {
    deadline_ms: f32,
    report: BattleReport,
}

/// A running tactical skirmish.
///
/// All mutable state (units, projectiles, phase) is owned exclusively
/// by this instance and only mutated inside [`Battle::tick`] or the
/// order/lifecycle methods.
#[derive(Debug)]
pub struct Battle {
    config: BattleConfig,
    field: Battlefield,
    arena: UnitArena,
    projectiles: Vec<Projectile>,
    rng: BattleRng,
    phase: TurnPhase,
    round: u32,
    wave: u32,
    running: bool,
    speed: f32,
    /// Real time since `start`, milliseconds. Monotonic.
    elapsed_ms: f32,
    /// Scaled execution time inside the current round.
    round_elapsed_ms: f32,
    /// Real-time deadline for the cover interlude, if armed.
    cover_deadline_ms: Option<f32>,
    /// Scaled time the battlefield has been continuously idle.
    idle_ms: f32,
    pending_end: Option<PendingEnd>,
    blue_kills: usize,
    red_kills: usize,
    /// Zone-control hold flags, cleared on any lapse in presence.
    blue_holds: bool,
    red_holds: bool,
}

impl Battle {
    /// Create a battle, generating its battlefield from the config.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        let field = Battlefield::generate(&config.map);
        Self::with_battlefield(config, field)
    }

    /// Create a battle on an externally supplied battlefield.
    ///
    /// The field is treated as immutable for the battle's duration; a
    /// wave-based caller may reuse the same field across battles.
    #[must_use]
    pub fn with_battlefield(config: BattleConfig, field: Battlefield) -> Self {
        let rng = BattleRng::new(config.seed ^ 0x5eed_b177);
        Self {
            config,
            field,
            arena: UnitArena::new(),
            projectiles: Vec::new(),
            rng,
            phase: TurnPhase::BluePlanning,
            round: 1,
            wave: 1,
            running: false,
            speed: 1.0,
            elapsed_ms: 0.0,
            round_elapsed_ms: 0.0,
            cover_deadline_ms: None,
            idle_ms: 0.0,
            pending_end: None,
            blue_kills: 0,
            red_kills: 0,
            blue_holds: false,
            red_holds: false,
        }
    }

    /// Spawn both armies and enter blue planning.
    pub fn start(&mut self, blue: &[UnitKind], red: &[UnitKind]) -> Result<Vec<BattleEvent>> {
        if self.running {
            return Err(BattleError::InvalidState("battle already running".into()));
        }
        self.arena.clear();
        self.projectiles.clear();
        spawn_army(&mut self.arena, &self.field, Team::Blue, blue, &mut self.rng);
        spawn_army(&mut self.arena, &self.field, Team::Red, red, &mut self.rng);
        self.running = true;
        self.phase = TurnPhase::BluePlanning;
        self.round = 1;
        self.wave = 1;
        self.elapsed_ms = 0.0;
        self.blue_kills = 0;
        self.red_kills = 0;
        info!(blue = blue.len(), red = red.len(), "battle started");
        Ok(vec![BattleEvent::PhaseChange {
            phase: self.phase,
            round: self.round,
        }])
    }

    /// End the current planning phase.
    ///
    /// Blue's confirmation arms the cover interlude; red's enters the
    /// execution phase.
    pub fn confirm_plan(&mut self) -> Result<Vec<BattleEvent>> {
        self.ensure_running()?;
        match self.phase {
            TurnPhase::BluePlanning => {
                self.phase = TurnPhase::Cover;
                self.cover_deadline_ms = Some(self.elapsed_ms + self.config.cover_duration_ms);
                Ok(vec![self.phase_event()])
            }
            TurnPhase::RedPlanning => Ok(self.enter_playing()),
            phase => Err(BattleError::InvalidState(format!(
                "confirm_plan during {phase:?}"
            ))),
        }
    }

    /// Skip the cover interlude immediately (AI-controlled red side).
    pub fn skip_cover(&mut self) -> Result<Vec<BattleEvent>> {
        self.ensure_running()?;
        if self.phase != TurnPhase::Cover {
            return Err(BattleError::InvalidState(format!(
                "skip_cover during {:?}",
                self.phase
            )));
        }
        self.cover_deadline_ms = None;
        self.phase = TurnPhase::RedPlanning;
        Ok(vec![self.phase_event()])
    }

    /// Set the simulation speed multiplier, clamped to a sane band.
    ///
    /// Scales only the execution-phase pipeline; cover and planning run
    /// in real time.
    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed = multiplier.clamp(0.1, 16.0);
    }

    /// Stop the battle and release everything it owns.
    pub fn stop(&mut self) {
        self.running = false;
        self.projectiles.clear();
        self.arena.clear();
        self.cover_deadline_ms = None;
        self.pending_end = None;
        info!("battle stopped");
    }

    /// Replace a unit's movement plan with an obstacle-detoured route
    /// through the given raw waypoints.
    ///
    /// Out-of-bounds waypoints are clamped, not rejected.
    pub fn plan_route(&mut self, id: UnitId, raw: &[Vec2]) -> Result<()> {
        self.ensure_running()?;
        let (pos, padding) = {
            let unit = self.arena.get(id).ok_or(BattleError::UnitNotFound(id))?;
            (unit.pos, unit.stats().radius + 6.0)
        };
        let route = pathing::plan_route(pos, raw, &self.field, padding);
        if let Some(unit) = self.arena.get_mut(id) {
            unit.set_route(route);
        }
        Ok(())
    }

    /// Set or clear a unit's preferred enemy.
    pub fn set_attack_target(&mut self, id: UnitId, target: Option<UnitId>) -> Result<()> {
        self.ensure_running()?;
        let unit = self.arena.get_mut(id).ok_or(BattleError::UnitNotFound(id))?;
        unit.attack_target_id = target;
        Ok(())
    }

    /// Spawn the next red wave after a [`BattleEvent::WaveClear`].
    ///
    /// Surviving blue units carry over; the battlefield persists.
    pub fn spawn_wave(&mut self, red: &[UnitKind]) -> Result<Vec<BattleEvent>> {
        self.ensure_running()?;
        if self.arena.alive_count(Team::Red) > 0 {
            return Err(BattleError::InvalidState(
                "red units still alive".into(),
            ));
        }
        self.wave += 1;
        spawn_army(&mut self.arena, &self.field, Team::Red, red, &mut self.rng);
        self.phase = TurnPhase::BluePlanning;
        info!(wave = self.wave, "wave spawned");
        Ok(vec![self.phase_event()])
    }

    /// Living units on a team.
    #[must_use]
    pub fn alive_count(&self, team: Team) -> usize {
        self.arena.alive_count(team)
    }

    /// Read access to all units.
    #[must_use]
    pub fn units(&self) -> &UnitArena {
        &self.arena
    }

    /// Read access to the battlefield geometry.
    #[must_use]
    pub fn map_data(&self) -> &Battlefield {
        &self.field
    }

    /// Projectiles currently in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Current turn phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Current round number (1-based).
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Current wave number (1-based).
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Whether the battle is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the battle by `delta_ms` of real time.
    ///
    /// During planning phases this only tracks time; during `Playing`
    /// it runs the full movement/combat pipeline at the scaled clock.
    pub fn tick(&mut self, delta_ms: f32) -> Vec<BattleEvent> {
        if !self.running || delta_ms <= 0.0 {
            return Vec::new();
        }
        self.elapsed_ms += delta_ms;

        let events = match self.phase {
            TurnPhase::Cover => self.tick_cover(),
            TurnPhase::BluePlanning | TurnPhase::RedPlanning => Vec::new(),
            TurnPhase::Playing => self.tick_playing(delta_ms),
        };

        trace!(hash = self.state_hash(), phase = ?self.phase, "tick");
        events
    }

    /// Digest of the mutable simulation state, folded in sorted unit
    /// order, for determinism checks in tests and replay verification.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        fn mix(h: u64, v: u64) -> u64 {
            (h ^ v).wrapping_mul(0x0100_0000_01b3)
        }
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        h = mix(h, u64::from(self.round));
        h = mix(h, u64::from(self.wave));
        h = mix(h, self.phase as u64);
        for id in self.arena.sorted_ids() {
            let Some(u) = self.arena.get(id) else { continue };
            h = mix(h, u64::from(u.id));
            h = mix(h, u64::from(u.pos.x.to_bits()));
            h = mix(h, u64::from(u.pos.y.to_bits()));
            h = mix(h, u64::from(u.vel.x.to_bits()));
            h = mix(h, u64::from(u.vel.y.to_bits()));
            h = mix(h, u64::from(u.hp.to_bits()));
            h = mix(h, u64::from(u.gun_angle.to_bits()));
            h = mix(h, u64::from(u.alive));
        }
        for p in &self.projectiles {
            h = mix(h, u64::from(p.pos.x.to_bits()));
            h = mix(h, u64::from(p.pos.y.to_bits()));
            h = mix(h, u64::from(p.damage.to_bits()));
        }
        h
    }

    fn ensure_running(&self) -> Result<()> {
        if self.running {
            Ok(())
        } else {
            Err(BattleError::InvalidState("battle not started".into()))
        }
    }

    fn phase_event(&self) -> BattleEvent {
        info!(phase = ?self.phase, round = self.round, "phase change");
        BattleEvent::PhaseChange {
            phase: self.phase,
            round: self.round,
        }
    }

    fn tick_cover(&mut self) -> Vec<BattleEvent> {
        match self.cover_deadline_ms {
            Some(deadline) if self.elapsed_ms >= deadline => {
                self.cover_deadline_ms = None;
                self.phase = TurnPhase::RedPlanning;
                vec![self.phase_event()]
            }
            _ => Vec::new(),
        }
    }

    fn enter_playing(&mut self) -> Vec<BattleEvent> {
        self.phase = TurnPhase::Playing;
        self.round_elapsed_ms = 0.0;
        self.idle_ms = 0.0;
        // Hold flags start armed and clear on the first lapse; holding
        // through the whole round means they are still set at round end.
        self.blue_holds = self.config.zone_control;
        self.red_holds = self.config.zone_control;
        vec![self.phase_event()]
    }

    fn tick_playing(&mut self, delta_ms: f32) -> Vec<BattleEvent> {
        let mut events = Vec::new();

        // Terminal delay after an elimination: the outcome is decided.
        // In-flight projectiles keep moving and land or expire, but
        // nobody moves or fires until the report lands.
        if let Some(pending) = &self.pending_end {
            let deadline = pending.deadline_ms;
            let report = pending.report;
            let dt = delta_ms * self.speed / 1000.0;
            let hits =
                combat::step_projectiles(&mut self.projectiles, &mut self.arena, &self.field, dt);
            events.extend(hits.into_iter().map(BattleEvent::Hit));
            if self.elapsed_ms >= deadline {
                self.pending_end = None;
                self.running = false;
                info!(winner = ?report.winner, condition = ?report.condition, "battle ended");
                events.push(BattleEvent::Ended(report));
            }
            return events;
        }

        let scaled_ms = delta_ms * self.speed;
        let dt = scaled_ms / 1000.0;
        self.round_elapsed_ms += scaled_ms;

        self.run_movement(dt);
        events.extend(self.run_combat(dt));

        for hit in events.iter().filter_map(|e| match e {
            BattleEvent::Hit(h) if h.killed => Some(h.team),
            _ => None,
        }) {
            match hit {
                Team::Blue => self.blue_kills += 1,
                Team::Red => self.red_kills += 1,
            }
        }

        self.update_idle(scaled_ms);
        if self.config.zone_control {
            self.update_zone_holds();
        }

        let blue_alive = self.arena.alive_count(Team::Blue);
        let red_alive = self.arena.alive_count(Team::Red);
        events.push(BattleEvent::Update {
            blue_alive,
            red_alive,
            remaining_round_ms: (self.config.round_duration_ms - self.round_elapsed_ms).max(0.0),
        });

        // Wave clear: red wiped out but more waves remain. Hands
        // control back to the caller instead of ending the battle.
        if red_alive == 0 && blue_alive > 0 && self.wave < self.config.total_waves {
            self.projectiles.clear();
            self.phase = TurnPhase::BluePlanning;
            debug!(wave = self.wave, "wave cleared");
            events.push(BattleEvent::WaveClear);
            return events;
        }

        if blue_alive == 0 || red_alive == 0 {
            let winner = match (blue_alive, red_alive) {
                (0, 0) => None,
                (0, _) => Some(Team::Red),
                _ => Some(Team::Blue),
            };
            self.arm_end(winner, WinCondition::Elimination);
            return events;
        }

        if self.idle_ms >= self.config.idle_completion_ms
            || self.round_elapsed_ms >= self.config.round_duration_ms
        {
            events.extend(self.end_round());
        }

        events
    }

    /// Waypoint advancement, steering, and the separation pass.
    fn run_movement(&mut self, dt: f32) {
        let ids = self.arena.sorted_ids();
        for &id in &ids {
            if let Some(unit) = self.arena.get_mut(id) {
                movement::advance_waypoint(unit);
            }
        }

        let neighbors = movement::neighbor_snapshot(&self.arena);
        for &id in &ids {
            if let Some(unit) = self.arena.get_mut(id) {
                movement::step_unit(unit, dt, &self.field, &neighbors, &mut self.rng);
            }
        }

        movement::separation_pass(&mut self.arena, &self.field);
    }

    /// Target acquisition, gun rotation, firing, projectile stepping.
    fn run_combat(&mut self, dt: f32) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        let bonus = self.config.elevation_range_bonus;

        for id in self.arena.sorted_ids() {
            let Some(unit) = self.arena.get(id) else { continue };
            if !unit.alive {
                continue;
            }
            let shooter = unit.clone();

            let target = targeting::find_target(
                &shooter,
                &self.arena,
                shooter.attack_target_id,
                &self.field,
            )
            .and_then(|tid| self.arena.get(tid))
            .cloned();

            let Some(target) = target else {
                if let Some(unit) = self.arena.get_mut(id) {
                    unit.fire_timer = (unit.fire_timer - dt * 1000.0).max(0.0);
                }
                continue;
            };

            let bearing = (target.pos - shooter.pos).angle();
            let can_fire = targeting::is_in_range(&shooter, &target, &self.field, bonus)
                && targeting::line_of_sight(shooter.pos, target.pos, &self.field);

            let Some(unit) = self.arena.get_mut(id) else { continue };
            combat::rotate_gun(unit, bearing, dt);
            if can_fire {
                if let Some(projectile) = combat::try_fire(unit, &target, &self.field, bonus, dt) {
                    events.push(BattleEvent::MuzzleFlash {
                        unit_id: id,
                        pos: unit.pos,
                        angle: projectile.vel.angle(),
                    });
                    self.projectiles.push(projectile);
                }
            } else {
                unit.fire_timer = (unit.fire_timer - dt * 1000.0).max(0.0);
            }
        }

        let hits = combat::step_projectiles(&mut self.projectiles, &mut self.arena, &self.field, dt);
        events.extend(hits.into_iter().map(BattleEvent::Hit));
        events
    }

    /// Debounced battlefield-idle tracking: nothing in flight, nobody
    /// moving or holding a plan, nobody with an in-range target.
    fn update_idle(&mut self, scaled_ms: f32) {
        if !self.projectiles.is_empty() {
            self.idle_ms = 0.0;
            return;
        }

        let ids = self.arena.sorted_ids();
        for &id in &ids {
            let Some(unit) = self.arena.get(id) else { continue };
            if !unit.alive {
                continue;
            }
            if unit.vel.length() >= STATIONARY_SPEED || !unit.is_idle() {
                self.idle_ms = 0.0;
                return;
            }
            let has_reachable = ids.iter().any(|&other| {
                self.arena.get(other).is_some_and(|enemy| {
                    enemy.alive
                        && enemy.team != unit.team
                        && targeting::is_in_range(
                            unit,
                            enemy,
                            &self.field,
                            self.config.elevation_range_bonus,
                        )
                })
            });
            if has_reachable {
                self.idle_ms = 0.0;
                return;
            }
        }

        self.idle_ms += scaled_ms;
    }

    /// Clear a side's hold flag on any lapse: no presence in the
    /// opposing spawn zone, or an opposing unit contesting it.
    fn update_zone_holds(&mut self) {
        let presence = |zone_owner: Team, team: Team| {
            let zone = self.field.spawn_zone(zone_owner);
            self.arena
                .iter()
                .any(|u| u.alive && u.team == team && zone.contains(u.pos))
        };

        if self.blue_holds
            && (!presence(Team::Red, Team::Blue) || presence(Team::Red, Team::Red))
        {
            self.blue_holds = false;
        }
        if self.red_holds
            && (!presence(Team::Blue, Team::Red) || presence(Team::Blue, Team::Blue))
        {
            self.red_holds = false;
        }
    }

    fn arm_end(&mut self, winner: Option<Team>, condition: WinCondition) {
        let report = BattleReport {
            winner,
            blue_survivors: self.arena.alive_count(Team::Blue),
            red_survivors: self.arena.alive_count(Team::Red),
            blue_kills: self.blue_kills,
            red_kills: self.red_kills,
            duration_ms: self.elapsed_ms,
            condition,
        };
        self.pending_end = Some(PendingEnd {
            deadline_ms: self.elapsed_ms + self.config.elimination_grace_ms,
            report,
        });
    }

    /// Round over without a terminal elimination: evaluate zone
    /// control, otherwise loop back to blue planning.
    fn end_round(&mut self) -> Vec<BattleEvent> {
        if self.config.zone_control && self.blue_holds != self.red_holds {
            let winner = if self.blue_holds { Team::Blue } else { Team::Red };
            let report = BattleReport {
                winner: Some(winner),
                blue_survivors: self.arena.alive_count(Team::Blue),
                red_survivors: self.arena.alive_count(Team::Red),
                blue_kills: self.blue_kills,
                red_kills: self.red_kills,
                duration_ms: self.elapsed_ms,
                condition: WinCondition::ZoneControl,
            };
            self.running = false;
            info!(winner = ?winner, "battle ended by zone control");
            return vec![BattleEvent::Ended(report)];
        }

        self.projectiles.clear();
        self.round += 1;
        self.phase = TurnPhase::BluePlanning;
        vec![self.phase_event()]
    }
}
