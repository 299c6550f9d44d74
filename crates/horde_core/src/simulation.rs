//! Core simulation loop.
//!
//! Owns every agent (actor, brain, state machine and random stream), the
//! session's [`Arbiter`] and the player-side [`TargetRegistry`], and advances
//! them at a fixed tick rate.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - One seeded random stream per actor, derived from the session seed
//! - Agents update in ascending id order
//! - Same inputs always produce the same [`Simulation::state_hash`]
//!
//! # Example
//!
//! ```
//! use horde_core::data::{presets, SimulationConfig, TargetConfig};
//! use horde_core::math::Vec2Fixed;
//! use horde_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(7)).unwrap();
//! sim.spawn_target(&TargetConfig::default(), Vec2Fixed::from_ints(4, 0))
//!     .unwrap();
//! sim.spawn_actor(presets::goblin(), Vec2Fixed::ZERO).unwrap();
//!
//! for _ in 0..120 {
//!     sim.step();
//! }
//! assert_eq!(sim.current_tick(), 120);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::actor::Actor;
use crate::arbiter::Arbiter;
use crate::brain::Brain;
use crate::combat::{DamageInstance, DamageOutcome, Damageable};
use crate::components::EntityId;
use crate::data::{ActorConfig, SimulationConfig, TargetConfig};
use crate::error::{AiError, Result};
use crate::events::AiEvent;
use crate::fsm::StateMachine;
use crate::math::{Fixed, Vec2Fixed};
use crate::rng::AiRng;
use crate::states::{AiState, AiStateKind, StateContext};
use crate::world::{Target, TargetRegistry};

/// One AI-driven entity with everything it owns.
#[derive(Debug, Clone)]
pub struct Agent {
    actor: Actor,
    brain: Brain,
    machine: StateMachine,
    rng: AiRng,
}

impl Agent {
    /// The driven actor.
    #[must_use]
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Decision state.
    #[must_use]
    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    /// State machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Active state.
    #[must_use]
    pub fn state(&self) -> &AiState {
        self.machine.current()
    }
}

/// Events generated during a simulation tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Tick number after advancing.
    pub tick: u64,
    /// Everything observable that happened, in emission order. Includes
    /// events from external calls made since the previous tick.
    pub events: Vec<AiEvent>,
    /// Actors removed this tick.
    pub despawned: Vec<EntityId>,
}

/// Shared borrows handed to one agent while it runs.
struct Session<'a> {
    arbiter: &'a mut Arbiter,
    targets: &'a mut TargetRegistry,
    events: &'a mut Vec<AiEvent>,
    dt: Fixed,
}

impl Session<'_> {
    /// Build a context for `agent` and run `f` with its brain and machine.
    fn run<R>(
        &mut self,
        agent: &mut Agent,
        f: impl FnOnce(&mut Brain, &mut StateMachine, &mut StateContext<'_>) -> R,
    ) -> R {
        let Agent {
            actor,
            brain,
            machine,
            rng,
        } = agent;
        let id = actor.id();
        let mut ctx = StateContext {
            actor,
            target: brain.target(),
            arbiter: self.arbiter.access(id),
            world: &mut *self.targets,
            rng,
            events: &mut *self.events,
            dt: self.dt,
        };
        f(brain, machine, &mut ctx)
    }
}

/// The AI simulation.
///
/// # Tick order
///
/// 1. Target timers advance
/// 2. Arbiter maintenance prunes dead and removed actors
/// 3. Each agent, in id order: vitals, brain, state execution
/// 4. Despawned agents are unregistered and removed
///
/// Movement is not applied by [`Self::tick`]; the physics layer (or
/// [`Self::integrate_motion`]) consumes each actor's velocity intent.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    dt: Fixed,
    tick: u64,
    next_id: EntityId,
    agents: BTreeMap<EntityId, Agent>,
    arbiter: Arbiter,
    targets: TargetRegistry,
    pending: Vec<AiEvent>,
}

impl Simulation {
    /// Create an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let arbiter = Arbiter::new(config.arbiter)?;
        Ok(Self {
            dt: config.dt(),
            config,
            tick: 0,
            next_id: 1,
            agents: BTreeMap::new(),
            arbiter,
            targets: TargetRegistry::new(),
            pending: Vec::new(),
        })
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> Fixed {
        self.dt
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The session arbiter.
    #[must_use]
    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Player-side targets.
    #[must_use]
    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Get an agent.
    #[must_use]
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of live or dying agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Get an actor.
    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.agents.get(&id).map(Agent::actor)
    }

    /// Active state of an actor.
    #[must_use]
    pub fn state(&self, id: EntityId) -> Option<&AiState> {
        self.agents.get(&id).map(Agent::state)
    }

    /// Number of agents currently in Attack.
    #[must_use]
    pub fn attacker_count(&self) -> usize {
        self.count_in(AiStateKind::Attack)
    }

    /// Number of agents currently in `kind`.
    #[must_use]
    pub fn count_in(&self, kind: AiStateKind) -> usize {
        self.agents
            .values()
            .filter(|agent| agent.machine.kind() == kind)
            .count()
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ========================================================================
    // World inputs
    // ========================================================================

    /// Add a player-side target.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] if the configuration is invalid.
    pub fn spawn_target(&mut self, config: &TargetConfig, position: Vec2Fixed) -> Result<EntityId> {
        config.validate()?;
        let id = self.allocate_id();
        self.targets.insert(Target::new(id, config, position));
        debug!(target = id, "Target spawned");
        Ok(id)
    }

    /// Remove a target.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such target exists.
    pub fn remove_target(&mut self, id: EntityId) -> Result<Target> {
        self.targets.remove(id).ok_or(AiError::EntityNotFound(id))
    }

    /// Teleport a target.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such target exists.
    pub fn move_target(&mut self, id: EntityId, position: Vec2Fixed) -> Result<()> {
        let target = self.targets.get_mut(id).ok_or(AiError::EntityNotFound(id))?;
        target.position = position;
        Ok(())
    }

    /// Hit a target from outside the AI (environment, scripted damage).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such target exists.
    pub fn damage_target(&mut self, id: EntityId, damage: DamageInstance) -> Result<DamageOutcome> {
        let target = self.targets.get_mut(id).ok_or(AiError::EntityNotFound(id))?;
        Ok(target.take_damage(damage))
    }

    /// Heal a target. Returns the amount actually restored.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such target exists.
    pub fn heal_target(&mut self, id: EntityId, amount: Fixed) -> Result<Fixed> {
        let target = self.targets.get_mut(id).ok_or(AiError::EntityNotFound(id))?;
        Ok(target.health.heal(amount))
    }

    /// Spawn an actor at `position`, register it with the arbiter and enter
    /// its resting state.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] if the configuration is invalid.
    pub fn spawn_actor(&mut self, config: ActorConfig, position: Vec2Fixed) -> Result<EntityId> {
        config.validate()?;
        let id = self.allocate_id();
        let actor = Actor::new(id, config, position);
        let initial = AiState::resting(&actor);
        let mut agent = Agent {
            actor,
            brain: Brain::new(),
            machine: StateMachine::new(initial),
            rng: AiRng::for_actor(self.config.seed, id),
        };

        self.arbiter.register(id, position);
        let mut session = Session {
            arbiter: &mut self.arbiter,
            targets: &mut self.targets,
            events: &mut self.pending,
            dt: self.dt,
        };
        session.run(&mut agent, |_, machine, ctx| machine.start(ctx));
        debug!(actor = id, name = %agent.actor.config().name, "Actor spawned");
        self.agents.insert(id, agent);
        Ok(id)
    }

    /// Remove an actor immediately, releasing any token it holds.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such actor exists.
    pub fn remove_actor(&mut self, id: EntityId) -> Result<Actor> {
        let agent = self.agents.remove(&id).ok_or(AiError::EntityNotFound(id))?;
        self.arbiter.unregister(id);
        debug!(actor = id, "Actor removed");
        Ok(agent.actor)
    }

    /// Hit an actor (player weapons, hazards).
    ///
    /// Emits [`AiEvent::Damaged`] for every hit that reaches the health
    /// record. A killing hit moves the actor to Dead at once, interrupting
    /// whatever it was doing.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::EntityNotFound`] if no such actor exists.
    pub fn damage_actor(&mut self, id: EntityId, damage: DamageInstance) -> Result<DamageOutcome> {
        let agent = self.agents.get_mut(&id).ok_or(AiError::EntityNotFound(id))?;
        let outcome = agent.actor.take_damage(damage);
        if !outcome.landed() {
            return Ok(outcome);
        }

        self.pending.push(AiEvent::Damaged {
            actor: id,
            damage,
            outcome,
        });
        if outcome.killed() {
            let mut session = Session {
                arbiter: &mut self.arbiter,
                targets: &mut self.targets,
                events: &mut self.pending,
                dt: self.dt,
            };
            session.run(agent, |_, machine, ctx| machine.die(ctx));
        }
        Ok(outcome)
    }

    // ========================================================================
    // Advancing
    // ========================================================================

    /// Advance the AI by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = std::mem::take(&mut self.pending);
        let mut despawned = Vec::new();

        self.targets.tick(self.dt);
        self.arbiter.maintain(
            self.agents
                .iter()
                .filter(|(_, agent)| agent.actor.is_alive())
                .map(|(id, agent)| (*id, agent.actor.position)),
        );

        let ids: Vec<EntityId> = self.agents.keys().copied().collect();
        for id in ids {
            let Some(agent) = self.agents.get_mut(&id) else {
                continue;
            };
            agent.actor.tick_vitals(self.dt);

            let mut session = Session {
                arbiter: &mut self.arbiter,
                targets: &mut self.targets,
                events: &mut events,
                dt: self.dt,
            };
            let despawn = session.run(agent, |brain, machine, ctx| {
                if !ctx.actor.is_alive() {
                    machine.die(ctx);
                }
                if !machine.is_dead() {
                    let next = brain.think(machine.current(), ctx);
                    machine.change_state(next, ctx);
                }
                machine.tick(ctx)
            });

            if despawn {
                self.agents.remove(&id);
                self.arbiter.unregister(id);
                debug!(actor = id, "Actor despawned");
                events.push(AiEvent::Despawned { actor: id });
                despawned.push(id);
            }
        }

        #[cfg(feature = "debug-validation")]
        {
            let attackers = self.attacker_count();
            assert!(
                attackers <= self.arbiter.capacity(),
                "{attackers} attackers exceed token capacity {}",
                self.arbiter.capacity()
            );
        }

        self.tick += 1;
        trace!(tick = self.tick, state_hash = self.state_hash(), "Simulation state hash");

        TickEvents {
            tick: self.tick,
            events,
            despawned,
        }
    }

    /// Apply every live actor's velocity intent for one tick.
    ///
    /// Stand-in for the external physics layer.
    pub fn integrate_motion(&mut self) {
        let dt = self.dt;
        for agent in self.agents.values_mut() {
            if agent.actor.collision_enabled {
                agent.actor.position += agent.actor.velocity * dt;
            }
        }
    }

    /// [`Self::tick`] followed by [`Self::integrate_motion`].
    pub fn step(&mut self) -> TickEvents {
        let events = self.tick();
        self.integrate_motion();
        events
    }

    /// Hash of everything that influences future ticks.
    ///
    /// Two simulations fed identical inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.agents.len().hash(&mut hasher);
        for (id, agent) in &self.agents {
            id.hash(&mut hasher);
            agent.actor.position.hash(&mut hasher);
            agent.actor.velocity.hash(&mut hasher);
            agent.actor.facing.hash(&mut hasher);
            agent.actor.health.hash(&mut hasher);
            agent.actor.energy.hash(&mut hasher);
            agent.actor.attack_cooldown.hash(&mut hasher);
            agent.brain.target().hash(&mut hasher);
            agent.machine.current().hash(&mut hasher);
        }

        for holder in self.arbiter.holders() {
            holder.hash(&mut hasher);
        }

        self.targets.len().hash(&mut hasher);
        for target in self.targets.iter() {
            target.id().hash(&mut hasher);
            target.position.hash(&mut hasher);
            target.health.hash(&mut hasher);
        }

        hasher.finish()
    }
}
