//! Run metrics for behavior analysis.
//!
//! [`MetricsCollector`] watches a simulation tick by tick and produces a
//! [`RunMetrics`] record; [`BatchSummary`] aggregates many of them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use horde_core::events::AiEvent;
use horde_core::simulation::{Simulation, TickEvents};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioResult;

/// Complete metrics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Session seed.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Token capacity in force.
    pub capacity: u32,
    /// Actor-ticks spent in each state, keyed by state name.
    pub state_ticks: BTreeMap<String, u64>,
    /// Highest number of actors in Attack on any tick.
    pub max_concurrent_attackers: usize,
    /// Ticks on which more actors were in Attack than the capacity allows.
    pub capacity_violations: u64,
    /// Windups started.
    pub attacks_committed: u64,
    /// Windups that hit.
    pub attacks_landed: u64,
    /// Windups that found nothing in range.
    pub attacks_missed: u64,
    /// Health removed from targets by landed attacks.
    pub damage_to_targets: f64,
    /// Targets killed by landed attacks.
    pub targets_killed: u64,
    /// Target acquisitions.
    pub targets_acquired: u64,
    /// Target losses.
    pub targets_lost: u64,
    /// State transitions.
    pub state_changes: u64,
    /// Actor deaths.
    pub deaths: u64,
    /// Actor despawns.
    pub despawns: u64,
    /// Actors alive when the run ended.
    pub surviving_actors: usize,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl RunMetrics {
    /// Fraction of resolved windups that landed.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let resolved = self.attacks_landed + self.attacks_missed;
        if resolved == 0 {
            0.0
        } else {
            self.attacks_landed as f64 / resolved as f64
        }
    }

    /// Actor-seconds spent in `state`.
    #[must_use]
    pub fn state_seconds(&self, state: &str) -> f64 {
        let ticks = self.state_ticks.get(state).copied().unwrap_or(0);
        ticks as f64 / f64::from(self.tick_rate.max(1))
    }

    /// Pretty JSON encoding.
    pub fn to_json(&self) -> ScenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> ScenarioResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Accumulates [`RunMetrics`] while a run progresses.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: RunMetrics,
}

impl MetricsCollector {
    /// Start collecting for `scenario` under the simulation's settings.
    #[must_use]
    pub fn new(scenario: impl Into<String>, sim: &Simulation) -> Self {
        let config = sim.config();
        Self {
            metrics: RunMetrics {
                scenario: scenario.into(),
                seed: config.seed,
                tick_rate: config.tick_rate,
                capacity: config.arbiter.capacity,
                ..RunMetrics::default()
            },
        }
    }

    /// Record one tick: the post-tick state and the events it produced.
    pub fn observe(&mut self, sim: &Simulation, events: &TickEvents) {
        let metrics = &mut self.metrics;
        metrics.ticks += 1;

        for agent in sim.agents() {
            let name = agent.state().kind().name();
            *metrics.state_ticks.entry(name.to_string()).or_default() += 1;
        }

        let attackers = sim.attacker_count();
        metrics.max_concurrent_attackers = metrics.max_concurrent_attackers.max(attackers);
        if attackers > metrics.capacity as usize {
            metrics.capacity_violations += 1;
        }

        for event in &events.events {
            match event {
                AiEvent::StateChanged { .. } => metrics.state_changes += 1,
                AiEvent::TargetAcquired { .. } => metrics.targets_acquired += 1,
                AiEvent::TargetLost { .. } => metrics.targets_lost += 1,
                AiEvent::AttackCommitted { .. } => metrics.attacks_committed += 1,
                AiEvent::AttackLanded { outcome, .. } => {
                    metrics.attacks_landed += 1;
                    metrics.damage_to_targets += outcome.dealt().to_num::<f64>();
                    if outcome.killed() {
                        metrics.targets_killed += 1;
                    }
                }
                AiEvent::AttackMissed { .. } => metrics.attacks_missed += 1,
                AiEvent::Died { .. } => metrics.deaths += 1,
                AiEvent::Despawned { .. } => metrics.despawns += 1,
                AiEvent::PatrolDestination { .. } | AiEvent::Damaged { .. } => {}
            }
        }
    }

    /// Metrics so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Close the record with the final state.
    #[must_use]
    pub fn finish(mut self, sim: &Simulation) -> RunMetrics {
        self.metrics.surviving_actors = sim
            .agents()
            .filter(|agent| !agent.machine().is_dead())
            .count();
        self.metrics.final_state_hash = sim.state_hash();
        self.metrics
    }
}

/// Summary statistics across multiple runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs aggregated.
    pub total_runs: u32,
    /// Average ticks per run.
    pub avg_ticks: f64,
    /// Average landed attacks per run.
    pub avg_attacks_landed: f64,
    /// Average missed attacks per run.
    pub avg_attacks_missed: f64,
    /// Landed over resolved windups across all runs.
    pub hit_rate: f64,
    /// Average damage to targets per run.
    pub avg_damage_to_targets: f64,
    /// Average actor deaths per run.
    pub avg_deaths: f64,
    /// Highest concurrent attacker count seen in any run.
    pub max_concurrent_attackers: usize,
    /// Capacity violations summed over every run; anything but zero is a bug.
    pub total_capacity_violations: u64,
    /// Share of actor-ticks spent per state.
    pub state_share: BTreeMap<String, f64>,
    /// Number of distinct final hashes.
    pub distinct_final_hashes: usize,
}

impl BatchSummary {
    /// Calculate summary from a list of run metrics.
    #[must_use]
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }
        let n = runs.len() as f64;
        let average = |f: fn(&RunMetrics) -> f64| runs.iter().map(f).sum::<f64>() / n;

        let landed: u64 = runs.iter().map(|r| r.attacks_landed).sum();
        let missed: u64 = runs.iter().map(|r| r.attacks_missed).sum();

        let mut state_totals: BTreeMap<String, u64> = BTreeMap::new();
        for run in runs {
            for (state, ticks) in &run.state_ticks {
                *state_totals.entry(state.clone()).or_default() += ticks;
            }
        }
        let actor_ticks: u64 = state_totals.values().sum();
        let state_share = state_totals
            .into_iter()
            .map(|(state, ticks)| (state, ticks as f64 / actor_ticks.max(1) as f64))
            .collect();

        let hashes: BTreeSet<u64> = runs.iter().map(|r| r.final_state_hash).collect();

        Self {
            total_runs: runs.len() as u32,
            avg_ticks: average(|r| r.ticks as f64),
            avg_attacks_landed: average(|r| r.attacks_landed as f64),
            avg_attacks_missed: average(|r| r.attacks_missed as f64),
            hit_rate: if landed + missed == 0 {
                0.0
            } else {
                landed as f64 / (landed + missed) as f64
            },
            avg_damage_to_targets: average(|r| r.damage_to_targets),
            avg_deaths: average(|r| r.deaths as f64),
            max_concurrent_attackers: runs
                .iter()
                .map(|r| r.max_concurrent_attackers)
                .max()
                .unwrap_or(0),
            total_capacity_violations: runs.iter().map(|r| r.capacity_violations).sum(),
            state_share,
            distinct_final_hashes: hashes.len(),
        }
    }
}
