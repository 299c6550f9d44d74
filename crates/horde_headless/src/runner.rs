//! Headless scenario execution.
//!
//! Every world input (initial spawns included) goes through a
//! [`Recorder`], so each run yields a replay alongside its metrics.

use horde_core::combat::DamageInstance;
use horde_core::components::EntityId;
use horde_core::math::{Fixed, Vec2Fixed};
use horde_core::replay::{Recorder, Replay, WorldInput};
use horde_core::simulation::{Simulation, TickEvents};
use tracing::{debug, info, warn};

use crate::metrics::{MetricsCollector, RunMetrics};
use crate::scenario::{ActorPlacement, Scenario, ScenarioResult, ScriptAction, ScriptedInput};

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Collected metrics.
    pub metrics: RunMetrics,
    /// Recording of every applied input.
    pub replay: Replay,
}

/// Drives one scenario tick by tick.
#[derive(Debug)]
pub struct ScenarioRunner {
    scenario: Scenario,
    recorder: Recorder,
    collector: MetricsCollector,
    targets: Vec<EntityId>,
    actors: Vec<EntityId>,
    timeline: Vec<ScriptedInput>,
    cursor: usize,
}

impl ScenarioRunner {
    /// Validate the scenario and spawn its targets and actors.
    pub fn new(scenario: Scenario) -> ScenarioResult<Self> {
        scenario.validate()?;
        let mut recorder = Recorder::new(scenario.name.clone(), scenario.simulation_config())?;

        let mut targets = Vec::with_capacity(scenario.targets.len());
        for placement in &scenario.targets {
            let input = WorldInput::SpawnTarget {
                config: placement.config,
                position: placement.spawn_point(),
            };
            if let Some(id) = recorder.apply(input)? {
                targets.push(id);
            }
        }

        let mut actors = Vec::with_capacity(scenario.initial_actor_count());
        for group in &scenario.actors {
            spawn_group(&mut recorder, group, &mut actors)?;
        }

        let mut timeline = scenario.timeline.clone();
        timeline.sort_by_key(|entry| entry.tick);

        let collector = MetricsCollector::new(scenario.name.clone(), recorder.simulation());
        info!(
            scenario = %scenario.name,
            seed = scenario.seed,
            targets = targets.len(),
            actors = actors.len(),
            ticks = scenario.ticks,
            "Scenario loaded"
        );

        Ok(Self {
            scenario,
            recorder,
            collector,
            targets,
            actors,
            timeline,
            cursor: 0,
        })
    }

    /// The scenario being run.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// The live simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        self.recorder.simulation()
    }

    /// Metrics collected so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        self.collector.metrics()
    }

    /// Runtime ids of the scenario's targets, by index.
    #[must_use]
    pub fn target_ids(&self) -> &[EntityId] {
        &self.targets
    }

    /// Runtime ids of the scenario's actors, by roster index.
    #[must_use]
    pub fn actor_ids(&self) -> &[EntityId] {
        &self.actors
    }

    /// Whether the scenario's run length has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.simulation().current_tick() >= self.scenario.ticks
    }

    /// Apply the inputs due this tick, then advance one tick.
    pub fn step(&mut self) -> TickEvents {
        let now = self.simulation().current_tick();
        while let Some(entry) = self.timeline.get(self.cursor) {
            if entry.tick > now {
                break;
            }
            let action = entry.action.clone();
            self.cursor += 1;
            self.apply_scripted(now, &action);
        }

        let events = self.recorder.step();
        self.collector.observe(self.recorder.simulation(), &events);
        events
    }

    /// Run to the scenario's length and return the outcome.
    #[must_use]
    pub fn run(mut self) -> RunOutcome {
        while !self.is_finished() {
            self.step();
        }
        self.finish()
    }

    /// Stop here and return what was collected.
    #[must_use]
    pub fn finish(self) -> RunOutcome {
        let metrics = self.collector.finish(self.recorder.simulation());
        let replay = self.recorder.finish();
        info!(
            scenario = %metrics.scenario,
            ticks = metrics.ticks,
            landed = metrics.attacks_landed,
            missed = metrics.attacks_missed,
            deaths = metrics.deaths,
            hash = metrics.final_state_hash,
            "Run complete"
        );
        RunOutcome { metrics, replay }
    }

    fn apply_scripted(&mut self, tick: u64, action: &ScriptAction) {
        if let ScriptAction::SpawnActor { placement } = action {
            if let Err(e) = spawn_group(&mut self.recorder, placement, &mut self.actors) {
                warn!(tick, error = %e, "Scripted spawn failed");
            }
            return;
        }

        let Some(input) = self.translate(action) else {
            warn!(tick, ?action, "Scripted input references an entity that does not exist yet");
            return;
        };
        debug!(tick, ?input, "Scripted input");
        if let Err(e) = self.recorder.apply(input) {
            // Typically a target already removed or an actor already despawned.
            debug!(tick, error = %e, "Scripted input skipped");
        }
    }

    fn translate(&self, action: &ScriptAction) -> Option<WorldInput> {
        let target = |index: &usize| self.targets.get(*index).copied();
        let actor = |index: &usize| self.actors.get(*index).copied();

        let input = match action {
            ScriptAction::MoveTarget { target: index, position } => WorldInput::MoveTarget {
                id: target(index)?,
                position: Vec2Fixed::from_f64(position.0, position.1),
            },
            ScriptAction::DamageTarget {
                target: index,
                amount,
                kind,
            } => WorldInput::DamageTarget {
                id: target(index)?,
                damage: DamageInstance::new(Fixed::from_num(*amount), *kind),
            },
            ScriptAction::HealTarget {
                target: index,
                amount,
            } => WorldInput::HealTarget {
                id: target(index)?,
                amount: Fixed::from_num(*amount),
            },
            ScriptAction::RemoveTarget { target: index } => WorldInput::RemoveTarget {
                id: target(index)?,
            },
            ScriptAction::DamageActor {
                actor: index,
                amount,
                kind,
            } => WorldInput::DamageActor {
                id: actor(index)?,
                damage: DamageInstance::new(Fixed::from_num(*amount), *kind),
            },
            ScriptAction::RemoveActor { actor: index } => WorldInput::RemoveActor {
                id: actor(index)?,
            },
            ScriptAction::SpawnActor { .. } => return None,
        };
        Some(input)
    }
}

fn spawn_group(
    recorder: &mut Recorder,
    group: &ActorPlacement,
    roster: &mut Vec<EntityId>,
) -> ScenarioResult<()> {
    let config = group.config()?;
    for position in group.spawn_points() {
        let input = WorldInput::SpawnActor {
            config: config.clone(),
            position,
        };
        if let Some(id) = recorder.apply(input)? {
            roster.push(id);
        }
    }
    Ok(())
}

/// Run `scenario` to completion.
pub fn run_scenario(scenario: Scenario) -> ScenarioResult<RunOutcome> {
    Ok(ScenarioRunner::new(scenario)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::states::AiStateKind;

    use crate::scenario::{TargetPlacement, BUILTIN_SCENARIOS};

    fn short(mut scenario: Scenario, ticks: u64) -> Scenario {
        scenario.ticks = ticks;
        scenario
    }

    #[test]
    fn test_builtins_never_exceed_capacity() {
        for name in BUILTIN_SCENARIOS {
            let scenario = Scenario::builtin(name).unwrap();
            let expected_ticks = scenario.ticks;
            let outcome = run_scenario(scenario).unwrap();
            assert_eq!(outcome.metrics.ticks, expected_ticks, "{name}");
            assert_eq!(outcome.metrics.capacity_violations, 0, "{name}");
            assert!(outcome.metrics.attacks_committed > 0, "{name}");
        }
    }

    #[test]
    fn test_same_seed_same_metrics() {
        let a = run_scenario(short(Scenario::gauntlet(), 600)).unwrap();
        let b = run_scenario(short(Scenario::gauntlet(), 600)).unwrap();
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_replay_of_run_verifies() {
        let outcome = run_scenario(short(Scenario::stampede(), 1300)).unwrap();
        assert_eq!(outcome.replay.final_tick, 1300);
        assert_eq!(outcome.replay.final_hash, outcome.metrics.final_state_hash);
        outcome.replay.verify().unwrap();
    }

    #[test]
    fn test_scripted_kills_and_reinforcements() {
        let outcome = run_scenario(short(Scenario::stampede(), 1300)).unwrap();
        assert_eq!(outcome.metrics.deaths, 3);
        assert_eq!(outcome.metrics.despawns, 3);
        // 10 initial, 3 killed, 3 reinforcements at tick 1200.
        assert_eq!(outcome.metrics.surviving_actors, 10);
    }

    #[test]
    fn test_scripted_move_applies_on_its_tick() {
        let mut runner = ScenarioRunner::new(Scenario::skirmish()).unwrap();
        let target = runner.target_ids()[0];
        while runner.simulation().current_tick() < 600 {
            runner.step();
        }
        let before = runner.simulation().targets().get(target).unwrap().position;
        runner.step();
        let after = runner.simulation().targets().get(target).unwrap().position;
        assert_ne!(before, after);
        assert_eq!(after, Vec2Fixed::from_ints(3, 0));
    }

    #[test]
    fn test_missing_reference_is_skipped() {
        let mut scenario = short(Scenario::skirmish(), 10);
        scenario.timeline = vec![
            ScriptedInput::new(1, ScriptAction::RemoveTarget { target: 0 }),
            ScriptedInput::new(2, ScriptAction::RemoveTarget { target: 0 }),
        ];
        let outcome = run_scenario(scenario).unwrap();
        // Only the successful removal is recorded after the seven spawns.
        assert_eq!(outcome.replay.input_count(), 8);
        outcome.replay.verify().unwrap();
    }

    #[test]
    fn test_siege_file_runs() {
        let scenario = Scenario::from_ron_str(include_str!("../scenarios/siege.ron")).unwrap();
        let outcome = run_scenario(short(scenario, 1600)).unwrap();
        assert_eq!(outcome.metrics.capacity, 3);
        assert_eq!(outcome.metrics.capacity_violations, 0);
        assert!(outcome.metrics.max_concurrent_attackers <= 3);
        assert_eq!(outcome.metrics.deaths, 1);
    }

    #[test]
    fn test_actors_without_targets_rest() {
        let mut scenario = short(Scenario::skirmish(), 30);
        scenario.targets = vec![TargetPlacement::sturdy((100.0, 100.0), 10.0)];
        scenario.timeline.clear();
        let runner = ScenarioRunner::new(scenario).unwrap();
        let outcome = runner.run();
        assert_eq!(outcome.metrics.targets_acquired, 0);
        assert_eq!(outcome.metrics.state_ticks.get(AiStateKind::Attack.name()), None);
    }
}
