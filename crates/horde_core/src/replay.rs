//! Replay system for recording and re-running AI sessions.
//!
//! A replay stores the session configuration and every world input applied
//! before each tick. Re-running the inputs against a fresh
//! [`Simulation`] must reproduce the recorded final state hash.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::DamageInstance;
use crate::components::EntityId;
use crate::data::{ActorConfig, SimulationConfig, TargetConfig};
use crate::error::{AiError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::simulation::{Simulation, TickEvents};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Something the outside world did to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldInput {
    /// Add a player-side target.
    SpawnTarget {
        /// Target settings.
        config: TargetConfig,
        /// Spawn point.
        position: Vec2Fixed,
    },
    /// Remove a target.
    RemoveTarget {
        /// Target id.
        id: EntityId,
    },
    /// Teleport a target (player movement).
    MoveTarget {
        /// Target id.
        id: EntityId,
        /// New position.
        position: Vec2Fixed,
    },
    /// Hit a target from outside the AI.
    DamageTarget {
        /// Target id.
        id: EntityId,
        /// The hit.
        damage: DamageInstance,
    },
    /// Heal a target.
    HealTarget {
        /// Target id.
        id: EntityId,
        /// Health to restore.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
    },
    /// Spawn an AI actor.
    SpawnActor {
        /// Behavior settings.
        config: ActorConfig,
        /// Spawn point and patrol origin.
        position: Vec2Fixed,
    },
    /// Remove an actor immediately.
    RemoveActor {
        /// Actor id.
        id: EntityId,
    },
    /// Hit an actor (player weapon).
    DamageActor {
        /// Actor id.
        id: EntityId,
        /// The hit.
        damage: DamageInstance,
    },
}

impl WorldInput {
    /// Apply the input. Returns the new entity id for spawns.
    ///
    /// # Errors
    ///
    /// Propagates configuration and missing-entity errors from the
    /// simulation.
    pub fn apply(&self, sim: &mut Simulation) -> Result<Option<EntityId>> {
        match self {
            Self::SpawnTarget { config, position } => sim.spawn_target(config, *position).map(Some),
            Self::RemoveTarget { id } => sim.remove_target(*id).map(|_| None),
            Self::MoveTarget { id, position } => sim.move_target(*id, *position).map(|()| None),
            Self::DamageTarget { id, damage } => sim.damage_target(*id, *damage).map(|_| None),
            Self::HealTarget { id, amount } => sim.heal_target(*id, *amount).map(|_| None),
            Self::SpawnActor { config, position } => {
                sim.spawn_actor(config.clone(), *position).map(Some)
            }
            Self::RemoveActor { id } => sim.remove_actor(*id).map(|_| None),
            Self::DamageActor { id, damage } => sim.damage_actor(*id, *damage).map(|_| None),
        }
    }
}

/// A single input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Simulation tick the input was applied before.
    pub tick: u64,
    /// The input.
    pub input: WorldInput,
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Session settings, including the seed.
    pub config: SimulationConfig,
    /// Inputs in tick order.
    pub inputs: Vec<ReplayInput>,
    /// Final tick when recording stopped.
    pub final_tick: u64,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Create an empty replay.
    #[must_use]
    pub fn new(scenario_id: impl Into<String>, config: SimulationConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            config,
            inputs: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        }
    }

    /// Record an input applied before `tick`.
    pub fn record(&mut self, tick: u64, input: WorldInput) {
        self.inputs.push(ReplayInput { tick, input });
    }

    /// Finalize the replay with end state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Session seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Inputs recorded for a tick.
    #[must_use]
    pub fn inputs_at_tick(&self, tick: u64) -> Vec<&WorldInput> {
        self.inputs
            .iter()
            .filter(|record| record.tick == tick)
            .map(|record| &record.input)
            .collect()
    }

    /// Total duration in ticks.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick
    }

    /// Number of recorded inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::ReplayError`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| AiError::ReplayError(format!("Failed to serialize replay: {e}")))
    }

    /// Decode from bincode, checking the format version.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::ReplayError`] for malformed data or a version
    /// mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| AiError::ReplayError(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(AiError::ReplayError(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::ReplayError`] if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| AiError::ReplayError(format!("Failed to write replay file: {e}")))?;
        debug!(path = %path.as_ref().display(), inputs = self.inputs.len(), "Replay saved");
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::ReplayError`] if reading or decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| AiError::ReplayError(format!("Failed to read replay file: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Re-run the whole replay and return the final simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an input fails
    /// to apply.
    pub fn run(&self) -> Result<Simulation> {
        let mut player = ReplayPlayer::new(self.clone())?;
        player.seek(self.final_tick)?;
        // Inputs applied after the last step still count toward the final hash.
        player.apply_due()?;
        Ok(player.simulation)
    }

    /// Re-run and compare the final state hash.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::ReplayMismatch`] if the hashes differ, or any
    /// error from [`Self::run`].
    pub fn verify(&self) -> Result<()> {
        let sim = self.run()?;
        let actual = sim.state_hash();
        if actual != self.final_hash {
            return Err(AiError::ReplayMismatch {
                tick: self.final_tick,
                expected: self.final_hash,
                actual,
            });
        }
        info!(
            scenario = %self.scenario_id,
            ticks = self.final_tick,
            hash = actual,
            "Replay verified"
        );
        Ok(())
    }
}

/// Drives a simulation while recording every input applied to it.
#[derive(Debug)]
pub struct Recorder {
    simulation: Simulation,
    replay: Replay,
}

impl Recorder {
    /// Start recording a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] for an invalid configuration.
    pub fn new(scenario_id: impl Into<String>, config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            simulation: Simulation::new(config)?,
            replay: Replay::new(scenario_id, config),
        })
    }

    /// Apply and record an input. Failed inputs are not recorded.
    ///
    /// # Errors
    ///
    /// Propagates the simulation's error.
    pub fn apply(&mut self, input: WorldInput) -> Result<Option<EntityId>> {
        let spawned = input.apply(&mut self.simulation)?;
        self.replay.record(self.simulation.current_tick(), input);
        Ok(spawned)
    }

    /// Advance one tick and integrate motion.
    pub fn step(&mut self) -> TickEvents {
        self.simulation.step()
    }

    /// The simulation being recorded.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Stop recording and finalize the replay with the current state.
    #[must_use]
    pub fn finish(mut self) -> Replay {
        self.replay
            .finalize(self.simulation.current_tick(), self.simulation.state_hash());
        self.replay
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    input_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] if the stored configuration is
    /// invalid.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = Simulation::new(replay.config)?;
        Ok(Self {
            replay,
            simulation,
            input_index: 0,
        })
    }

    /// Advance by one tick, applying that tick's inputs first.
    ///
    /// Returns `Ok(true)` while more ticks remain.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorded input fails to apply.
    pub fn advance(&mut self) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }

        self.apply_due()?;
        self.simulation.step();

        Ok(!self.is_finished())
    }

    fn apply_due(&mut self) -> Result<()> {
        let tick = self.simulation.current_tick();
        while let Some(record) = self.replay.inputs.get(self.input_index) {
            if record.tick > tick {
                break;
            }
            record.input.apply(&mut self.simulation)?;
            self.input_index += 1;
        }
        Ok(())
    }

    /// Play from the start up to `target_tick`.
    ///
    /// # Errors
    ///
    /// Returns an error if the simulation cannot be rebuilt or an input
    /// fails to apply.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = Simulation::new(self.replay.config)?;
        self.input_index = 0;
        while self.current_tick() < target_tick && self.advance()? {}
        Ok(())
    }

    /// Current playback tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.current_tick()
    }

    /// Current simulation state.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether playback reached the final tick.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_tick() >= self.replay.final_tick
    }
}
