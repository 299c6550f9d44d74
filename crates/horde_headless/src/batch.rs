//! Batch runner for behavior sweeps.
//!
//! Runs one scenario under many seeds in parallel using rayon and
//! aggregates the per-run metrics.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, RunMetrics};
use crate::runner::run_scenario;
use crate::scenario::{Scenario, ScenarioError, ScenarioResult};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs
    pub runs: u32,
    /// First seed; run `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Worker threads (0 = rayon default)
    pub parallel: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            seed_start: 0,
            parallel: 0,
        }
    }
}

impl BatchConfig {
    /// Config for `runs` runs.
    pub fn new(runs: u32) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set worker thread count
    pub fn with_parallel(mut self, threads: u32) -> Self {
        self.parallel = threads;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Per-run metrics, in seed order
    pub runs: Vec<RunMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Wall-clock runtime
    pub duration_seconds: f64,
    /// Runs that failed
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file
    pub fn save(&self, path: &Path) -> ScenarioResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Default file name inside an output directory
    pub fn default_path(output_dir: &Path) -> PathBuf {
        output_dir.join("batch_results.json")
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index
    pub run_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run `scenario` under `config.runs` consecutive seeds.
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> ScenarioResult<BatchResults> {
    scenario.validate()?;
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        scenario = %scenario.name,
        runs = config.runs,
        seed_start = config.seed_start,
        parallel = config.parallel,
        "Starting batch run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel as usize)
        .build()
        .map_err(|e| ScenarioError::WorkerPool(e.to_string()))?;

    let results: Vec<Result<RunMetrics, BatchError>> = pool.install(|| {
        (0..config.runs)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let outcome = run_scenario(scenario.clone().with_seed(seed));
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    debug!("Progress: {}/{}", done, config.runs);
                }
                outcome.map(|o| o.metrics).map_err(|e| {
                    warn!(run = i, seed, error = %e, "Run failed");
                    BatchError {
                        run_index: i,
                        seed,
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    });

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunMetrics> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} runs in {:.1}s ({:.1} runs/sec)",
        runs.len(),
        duration_seconds,
        runs.len() as f64 / duration_seconds.max(0.001)
    );

    Ok(BatchResults {
        scenario: scenario.name.clone(),
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    })
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Seed checked
    pub seed: u64,
    /// Final hash of every run, in run order
    pub hashes: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended on the same hash.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// Run the same seed `runs` times in parallel and compare final hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u64,
    runs: u32,
) -> ScenarioResult<DeterminismReport> {
    let hashes = (0..runs.max(1))
        .into_par_iter()
        .map(|_| run_scenario(scenario.clone().with_seed(seed)).map(|o| o.metrics.final_state_hash))
        .collect::<ScenarioResult<Vec<u64>>>()?;
    Ok(DeterminismReport { seed, hashes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> Scenario {
        let mut scenario = Scenario::skirmish();
        scenario.ticks = 240;
        scenario
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500).with_seed(12345).with_parallel(2);
        assert_eq!(config.runs, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.parallel, 2);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(&quick(), BatchConfig::new(6).with_seed(40)).unwrap();
        assert_eq!(results.runs.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_runs, 6);
        assert_eq!(results.summary.total_capacity_violations, 0);
        let seeds: Vec<u64> = results.runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, (40..46).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_is_reproducible() {
        let a = run_batch(&quick(), BatchConfig::new(4).with_parallel(2)).unwrap();
        let b = run_batch(&quick(), BatchConfig::new(4).with_parallel(1)).unwrap();
        assert_eq!(a.runs, b.runs);
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&quick(), 12345, 4).unwrap();
        assert_eq!(report.hashes.len(), 4);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let mut scenario = quick();
        scenario.capacity = 0;
        assert!(run_batch(&scenario, BatchConfig::new(2)).is_err());
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(&quick(), BatchConfig::new(3)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = BatchResults::default_path(dir.path());

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.runs, results.runs);
        assert_eq!(loaded.scenario, "skirmish");
    }
}
