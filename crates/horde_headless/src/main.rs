//! Headless horde AI runner.
//!
//! Runs scenarios without graphics and reports JSON metrics on stdout.
//! Designed for behavior tuning, CI testing, and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Run a built-in scenario
//! cargo run -p horde_headless -- run --scenario skirmish --seed 7
//!
//! # Run a batch of seeds in parallel
//! cargo run -p horde_headless -- batch --scenario gauntlet --runs 500 --output results/
//!
//! # Check determinism
//! cargo run -p horde_headless -- verify --scenario stampede --runs 8
//!
//! # Record and replay
//! cargo run -p horde_headless -- record --scenario skirmish --output skirmish.replay
//! cargo run -p horde_headless -- replay --file skirmish.replay --verify
//! ```
//!
//! Logs go to stderr; `-v` raises verbosity and `RUST_LOG` overrides it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use horde_core::data::presets::{self, PRESET_NAMES};
use horde_core::replay::{Replay, ReplayPlayer};
use horde_headless::{
    batch::{run_batch, verify_determinism, BatchConfig, BatchResults},
    runner::ScenarioRunner,
    scenario::{Scenario, ScenarioResult, BUILTIN_SCENARIOS},
};

#[derive(Parser)]
#[command(name = "horde")]
#[command(about = "Headless hostile-actor AI runner for behavior testing and CI")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario and print its metrics as JSON
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the run length in ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Also write the metrics to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run many seeds in parallel and aggregate
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        runs: u32,

        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run a scenario and save its replay
    Record {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Replay file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// List built-in presets and scenarios
    Presets {
        /// Print each preset as RON instead of a summary table
        #[arg(long)]
        ron: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries JSON; logs go to stderr.
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            ticks,
            output,
        } => cmd_run(&scenario, seed, ticks, output),
        Commands::Batch {
            scenario,
            runs,
            seed,
            parallel,
            output,
        } => cmd_batch(&scenario, runs, seed, parallel, output),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Record {
            scenario,
            seed,
            output,
        } => cmd_record(&scenario, seed, output),
        Commands::Replay { file, verify } => cmd_replay(file, verify),
        Commands::Presets { ron } => cmd_presets(ron),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(name: &str, seed: Option<u64>) -> ScenarioResult<Scenario> {
    let scenario = Scenario::resolve(name)?;
    Ok(match seed {
        Some(seed) => scenario.with_seed(seed),
        None => scenario,
    })
}

/// Run a single scenario
fn cmd_run(
    scenario: &str,
    seed: Option<u64>,
    ticks: Option<u64>,
    output: Option<PathBuf>,
) -> ScenarioResult<bool> {
    let mut scenario = load_scenario(scenario, seed)?;
    if let Some(ticks) = ticks {
        scenario.ticks = ticks;
    }

    let outcome = ScenarioRunner::new(scenario)?.run();
    let metrics = outcome.metrics;
    println!("{}", metrics.to_json()?);

    if let Some(path) = output {
        metrics.save(&path)?;
        eprintln!("Metrics saved to: {}", path.display());
    }

    if metrics.capacity_violations > 0 {
        eprintln!(
            "FAIL: {} ticks exceeded the token capacity",
            metrics.capacity_violations
        );
        return Ok(false);
    }
    Ok(true)
}

/// Run a batch of seeds
fn cmd_batch(
    scenario: &str,
    runs: u32,
    seed: u64,
    parallel: u32,
    output: PathBuf,
) -> ScenarioResult<bool> {
    let scenario = load_scenario(scenario, None)?;
    std::fs::create_dir_all(&output)?;

    let config = BatchConfig::new(runs)
        .with_seed(seed)
        .with_parallel(parallel);
    let results = run_batch(&scenario, config)?;

    let results_path = BatchResults::default_path(&output);
    results.save(&results_path)?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE: {}", results.scenario);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs: {}", results.runs.len());
    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Hit rate: {:.1}%", summary.hit_rate * 100.0);
    eprintln!("Avg damage to targets: {:.1}", summary.avg_damage_to_targets);
    eprintln!("Max concurrent attackers: {}", summary.max_concurrent_attackers);
    eprintln!("Capacity violations: {}", summary.total_capacity_violations);
    eprintln!("\nTime per state:");
    for (state, share) in &summary.state_share {
        eprintln!("  {:<8} {:>5.1}%", state, share * 100.0);
    }

    for error in results.errors.iter().take(10) {
        eprintln!("  Run {} (seed {}): {}", error.run_index, error.seed, error.message);
    }
    if results.errors.len() > 10 {
        eprintln!("  ... and {} more failures", results.errors.len() - 10);
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    Ok(results.errors.is_empty() && summary.total_capacity_violations == 0)
}

/// Verify determinism and replay fidelity
fn cmd_verify(scenario: &str, seed: u64, runs: u32) -> ScenarioResult<bool> {
    let scenario = load_scenario(scenario, Some(seed))?;
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    let report = verify_determinism(&scenario, seed, runs)?;
    if !report.is_deterministic() {
        eprintln!("FAIL: Non-determinism detected!");
        for (i, hash) in report.hashes.iter().enumerate() {
            eprintln!("  run {i}: {hash:016x}");
        }
        return Ok(false);
    }

    let outcome = ScenarioRunner::new(scenario)?.run();
    outcome.replay.verify()?;

    eprintln!(
        "PASS: All {} runs produced hash {:016x}; replay matches",
        report.hashes.len(),
        outcome.metrics.final_state_hash
    );
    Ok(true)
}

/// Run a scenario and save the replay
fn cmd_record(scenario: &str, seed: Option<u64>, output: PathBuf) -> ScenarioResult<bool> {
    let scenario = load_scenario(scenario, seed)?;
    let outcome = ScenarioRunner::new(scenario)?.run();
    outcome.replay.save(&output)?;

    eprintln!("Recorded replay: {}", output.display());
    eprintln!("  Scenario: {}", outcome.replay.scenario_id);
    eprintln!("  Seed: {}", outcome.replay.seed());
    eprintln!("  Inputs: {}", outcome.replay.input_count());
    eprintln!("  Duration: {} ticks", outcome.replay.duration());
    eprintln!("  Final hash: {:016x}", outcome.replay.final_hash);
    Ok(true)
}

/// Play back or verify a recorded replay
fn cmd_replay(file: PathBuf, verify: bool) -> ScenarioResult<bool> {
    let replay = Replay::load(&file)?;

    eprintln!("Loaded replay:");
    eprintln!("  Scenario: {}", replay.scenario_id);
    eprintln!("  Seed: {}", replay.seed());
    eprintln!("  Inputs: {}", replay.input_count());
    eprintln!("  Duration: {} ticks", replay.duration());

    if verify {
        eprintln!("Verifying replay...");
        return match replay.verify() {
            Ok(()) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Hash: {:016x}", replay.final_hash);
                Ok(true)
            }
            Err(horde_core::error::AiError::ReplayMismatch {
                expected, actual, ..
            }) => {
                eprintln!("FAIL: Replay produced different hash!");
                eprintln!("  Expected: {expected:016x}");
                eprintln!("  Actual:   {actual:016x}");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        };
    }

    let total = replay.duration();
    let mut player = ReplayPlayer::new(replay)?;
    let mut last_percent = 0;
    while player.advance()? {
        let percent = player.current_tick() * 100 / total.max(1);
        if percent > last_percent && percent % 10 == 0 {
            eprintln!("Progress: {percent}%");
            last_percent = percent;
        }
    }

    let sim = player.simulation();
    eprintln!("Replay complete at tick {}", player.current_tick());
    eprintln!("Final state hash: {:016x}", sim.state_hash());
    eprintln!("\nFinal State:");
    eprintln!("  Actors: {}", sim.agent_count());
    eprintln!("  Targets: {}", sim.targets().len());
    eprintln!("  Tokens held: {}", sim.arbiter().tokens_held());
    Ok(true)
}

/// List presets and built-in scenarios
fn cmd_presets(ron: bool) -> ScenarioResult<bool> {
    if ron {
        for config in presets::all() {
            let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
                .map_err(|e| horde_core::error::AiError::DataParseError {
                    path: config.name.clone(),
                    message: e.to_string(),
                })?;
            println!("// {}\n{}\n", config.name, text);
        }
        return Ok(true);
    }

    println!(
        "{:<10} {:>6} {:>6} {:>6} {:>6} {:>7} {:>6}",
        "preset", "speed", "health", "damage", "range", "ranged", "detect"
    );
    for name in PRESET_NAMES {
        let Some(config) = presets::by_name(name) else {
            continue;
        };
        println!(
            "{:<10} {:>6.1} {:>6.0} {:>6.1} {:>6.1} {:>7} {:>6.1}",
            name,
            config.move_speed.to_num::<f64>(),
            config.max_health.to_num::<f64>(),
            config.attack_damage.to_num::<f64>(),
            config.attack_range.to_num::<f64>(),
            config.ranged,
            config.detection_range.to_num::<f64>(),
        );
    }

    println!("\nScenarios:");
    for name in BUILTIN_SCENARIOS {
        if let Some(scenario) = Scenario::builtin(name) {
            println!("  {:<10} {}", name, scenario.description);
        }
    }
    Ok(true)
}
