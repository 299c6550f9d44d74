//! Headless scenario runner for AI behavior testing and CI verification.
//!
//! This crate drives `horde_core` simulations without any presentation
//! layer. It provides:
//!
//! - **Scenarios**: RON files (or built-ins) describing targets, actor
//!   placements, and a scripted timeline of world inputs
//! - **Metrics**: per-run counters (time per state, token usage, attack
//!   outcomes, deaths) serialized as JSON
//! - **Batch runs**: many seeds in parallel with aggregate summaries
//! - **Replay verification**: every run is recorded and can be re-run to
//!   check the final state hash
//!
//! # Example
//!
//! ```bash
//! # Run a built-in scenario and print metrics
//! cargo run -p horde_headless -- run --scenario skirmish
//!
//! # Sweep 200 seeds of a scenario file
//! cargo run -p horde_headless -- batch --scenario scenarios/ambush.ron --runs 200
//!
//! # Record, then verify, a replay
//! cargo run -p horde_headless -- record --scenario gauntlet --output gauntlet.replay
//! cargo run -p horde_headless -- replay --file gauntlet.replay --verify
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, DeterminismReport};
pub use metrics::{BatchSummary, MetricsCollector, RunMetrics};
pub use runner::{run_scenario, RunOutcome, ScenarioRunner};
pub use scenario::{Scenario, ScenarioError, ScenarioResult, BUILTIN_SCENARIOS};
