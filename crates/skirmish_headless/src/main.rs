//! Headless skirmish battle runner.
//!
//! Runs battles without graphics for CI verification, balance batches
//! and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run a single battle with ASCII output
//! cargo run -p skirmish_headless -- run --scenario squad_clash --render
//!
//! # Run a batch and print win rates
//! cargo run -p skirmish_headless -- batch --scenario squad_clash --count 100
//!
//! # Verify determinism of one seed
//! cargo run -p skirmish_headless -- verify --scenario duel --seed 42 --runs 5
//!
//! # Throughput benchmark
//! cargo run -p skirmish_headless -- benchmark --ticks 36000
//! ```
//!
//! Logs go to stderr; summary output to stderr as well, so stdout stays
//! free for machine-readable output.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_headless::runner::{run_battle, verify_determinism, RunOptions};
use skirmish_headless::scenario::Scenario;
use skirmish_headless::{commander, render};
use skirmish_core::units::Team;

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish battle runner for CI and balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single battle
    Run {
        /// Scenario preset name or JSON file path
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Battle seed
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Simulation speed multiplier
        #[arg(long, default_value = "4.0")]
        speed: f32,

        /// Rounds before calling a draw
        #[arg(long, default_value = "20")]
        max_rounds: u32,

        /// Print ASCII frames while the battle plays
        #[arg(long)]
        render: bool,
    },

    /// Run a batch of battles and summarize win rates
    Batch {
        /// Scenario preset name or JSON file path
        #[arg(short, long, default_value = "squad_clash")]
        scenario: String,

        /// Number of battles
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting seed (each battle uses seed + index)
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario preset name or JSON file path
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run N execution-phase ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Scenario preset name or JSON file path
        #[arg(short, long, default_value = "squad_clash")]
        scenario: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            speed,
            max_rounds,
            render,
        } => cmd_run(&scenario, seed, speed, max_rounds, render),
        Commands::Batch {
            scenario,
            count,
            seed,
        } => cmd_batch(&scenario, count, seed),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Benchmark { ticks, scenario } => cmd_benchmark(ticks, &scenario),
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario '{name}': {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(scenario: &str, seed: u64, speed: f32, max_rounds: u32, render: bool) {
    let scenario = load_scenario(scenario);
    let options = RunOptions {
        seed,
        speed,
        max_rounds,
        render,
        ..RunOptions::default()
    };

    match run_battle(&scenario, &options) {
        Ok(outcome) => {
            eprintln!("\n{}", "=".repeat(50));
            eprintln!("BATTLE COMPLETE: {}", scenario.name);
            eprintln!("{}", "=".repeat(50));
            eprintln!("Winner: {:?}", outcome.winner);
            eprintln!("Condition: {:?}", outcome.condition);
            eprintln!("Rounds: {}", outcome.rounds);
            eprintln!(
                "Survivors: blue {} / red {}",
                outcome.blue_survivors, outcome.red_survivors
            );
            eprintln!("Duration: {:.1}s", outcome.duration_ms / 1000.0);
            eprintln!("State hash: {:016x}", outcome.final_hash);
        }
        Err(e) => {
            eprintln!("Battle failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_batch(scenario: &str, count: u32, seed_start: u64) {
    let scenario = load_scenario(scenario);
    let mut blue_wins = 0u32;
    let mut red_wins = 0u32;
    let mut draws = 0u32;
    let mut failures = 0u32;

    let start = std::time::Instant::now();
    for i in 0..count {
        let options = RunOptions {
            seed: seed_start + u64::from(i),
            speed: 8.0,
            ..RunOptions::default()
        };
        match run_battle(&scenario, &options) {
            Ok(outcome) => match outcome.winner {
                Some(Team::Blue) => blue_wins += 1,
                Some(Team::Red) => red_wins += 1,
                None => draws += 1,
            },
            Err(e) => {
                tracing::error!(seed = options.seed, error = %e, "battle failed");
                failures += 1;
            }
        }
    }
    let elapsed = start.elapsed();

    let played = f64::from(count.max(1));
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE: {} ({count} battles)", scenario.name);
    eprintln!("{}", "=".repeat(50));
    eprintln!(
        "Blue wins: {blue_wins} ({:.1}%)",
        f64::from(blue_wins) / played * 100.0
    );
    eprintln!(
        "Red wins:  {red_wins} ({:.1}%)",
        f64::from(red_wins) / played * 100.0
    );
    eprintln!("Draws: {draws}");
    if failures > 0 {
        eprintln!("FAILED battles: {failures}");
    }
    eprintln!("Duration: {:.1}s", elapsed.as_secs_f64());
    eprintln!(
        "Throughput: {:.1} battles/sec",
        played / elapsed.as_secs_f64().max(0.001)
    );
}

fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    let scenario = load_scenario(scenario);
    let options = RunOptions {
        seed,
        speed: 8.0,
        ..RunOptions::default()
    };

    match verify_determinism(&scenario, &options, runs) {
        Ok(true) => eprintln!("PASS: all {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_benchmark(ticks: u64, scenario: &str) {
    let scenario = load_scenario(scenario);
    let mut battle = match scenario.start_battle(12345) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to start battle: {e}");
            std::process::exit(1);
        }
    };

    // Drive into the execution phase with orders issued.
    commander::issue_orders(&mut battle, Team::Blue);
    let _ = battle.confirm_plan();
    let _ = battle.skip_cover();
    commander::issue_orders(&mut battle, Team::Red);
    let _ = battle.confirm_plan();

    eprintln!("Benchmarking {ticks} ticks of '{}'", scenario.name);

    // Warmup
    for _ in 0..100 {
        battle.tick(16.0);
    }

    let start = std::time::Instant::now();
    for _ in 0..ticks {
        battle.tick(16.0);
    }
    let elapsed = start.elapsed();

    let tps = ticks as f64 / elapsed.as_secs_f64();
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {ticks}");
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("State hash: {:016x}", battle.state_hash());
    eprintln!("{}", render::render_ascii(&battle, &render::RenderConfig::default()));
}
