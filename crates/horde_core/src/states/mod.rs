//! Behavior states.
//!
//! [`AiState`] is a tagged union: each variant carries its own private
//! timing data. Behavior lives in one module per state as plain functions,
//! collected into a [`StateHandlers`] table per [`AiStateKind`]. Adding a
//! variant without handlers fails to compile.
//!
//! | State  | Entry                         | Per tick                        | Leaves when                     |
//! |--------|-------------------------------|---------------------------------|---------------------------------|
//! | Idle   | stop                          | hold                            | brain acquires a target         |
//! | Patrol | stop, half wait               | wait, then seek random point    | brain acquires a target         |
//! | Chase  | stop, arm reaction timer      | hold until reacted, then seek   | brain: in range / lost target   |
//! | Attack | face, stop, arm windup        | windup → hit → recovery         | recovery ends → Chase           |
//! | Strafe | random orbit sign + duration  | orbit, hold distance, retry     | token granted → Attack          |
//! | Flee   | arm flee timer                | run from threat                 | timer ends → Idle/Patrol        |
//! | Dead   | stop, disable collision       | wait for despawn                | never (actor removed)           |

mod attack;
mod chase;
mod dead;
mod flee;
mod idle;
mod patrol;
mod strafe;

use serde::{Deserialize, Serialize};

pub use attack::{AttackPhase, AttackState};
pub use chase::ChaseState;
pub use dead::DeadState;
pub use flee::FleeState;
pub use patrol::PatrolState;
pub use strafe::StrafeState;

use crate::actor::Actor;
use crate::arbiter::ArbiterAccess;
use crate::components::EntityId;
use crate::events::AiEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::rng::AiRng;
use crate::world::{TargetView, WorldQuery};

// ============================================================================
// State values
// ============================================================================

/// Discriminant of [`AiState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AiStateKind {
    /// Standing still.
    Idle,
    /// Wandering around the spawn point.
    Patrol,
    /// Closing in on the target.
    Chase,
    /// Committed attack (windup or recovery).
    Attack,
    /// Orbiting the target while waiting for a token.
    Strafe,
    /// Running from the target.
    Flee,
    /// Terminal.
    Dead,
}

impl AiStateKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::Patrol,
        Self::Chase,
        Self::Attack,
        Self::Strafe,
        Self::Flee,
        Self::Dead,
    ];

    /// Lowercase name for reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::Strafe => "strafe",
            Self::Flee => "flee",
            Self::Dead => "dead",
        }
    }

    /// Enter/execute/exit functions for this kind.
    #[must_use]
    pub fn handlers(self) -> StateHandlers {
        match self {
            Self::Idle => StateHandlers {
                enter: idle::enter,
                execute: idle::execute,
                exit: idle::exit,
            },
            Self::Patrol => StateHandlers {
                enter: patrol::enter,
                execute: patrol::execute,
                exit: patrol::exit,
            },
            Self::Chase => StateHandlers {
                enter: chase::enter,
                execute: chase::execute,
                exit: chase::exit,
            },
            Self::Attack => StateHandlers {
                enter: attack::enter,
                execute: attack::execute,
                exit: attack::exit,
            },
            Self::Strafe => StateHandlers {
                enter: strafe::enter,
                execute: strafe::execute,
                exit: strafe::exit,
            },
            Self::Flee => StateHandlers {
                enter: flee::enter,
                execute: flee::execute,
                exit: flee::exit,
            },
            Self::Dead => StateHandlers {
                enter: dead::enter,
                execute: dead::execute,
                exit: dead::exit,
            },
        }
    }
}

/// The active behavior of one actor, with its private timing data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AiState {
    /// Standing still.
    Idle,
    /// Wandering around an origin.
    Patrol(PatrolState),
    /// Closing in on the target.
    Chase(ChaseState),
    /// Committed attack.
    Attack(AttackState),
    /// Orbiting the target.
    Strafe(StrafeState),
    /// Running from the target.
    Flee(FleeState),
    /// Terminal.
    Dead(DeadState),
}

impl AiState {
    /// Idle state.
    #[must_use]
    pub fn idle() -> Self {
        Self::Idle
    }

    /// Patrol around `origin`.
    #[must_use]
    pub fn patrol(origin: Vec2Fixed, radius: Fixed, wait_time: Fixed) -> Self {
        Self::Patrol(PatrolState::new(origin, radius, wait_time))
    }

    /// Patrol if `actor` is configured to, otherwise idle.
    #[must_use]
    pub fn resting(actor: &Actor) -> Self {
        match &actor.config().patrol {
            Some(patrol) => Self::patrol(actor.home(), patrol.radius, patrol.wait_time),
            None => Self::idle(),
        }
    }

    /// Chase after a reaction delay.
    #[must_use]
    pub fn chase(reaction_delay: Fixed) -> Self {
        Self::Chase(ChaseState::new(reaction_delay))
    }

    /// Start an attack windup.
    #[must_use]
    pub fn attack() -> Self {
        Self::Attack(AttackState::default())
    }

    /// Orbit the target.
    #[must_use]
    pub fn strafe() -> Self {
        Self::Strafe(StrafeState::default())
    }

    /// Flee from `threat`, if known.
    #[must_use]
    pub fn flee(threat: Option<Vec2Fixed>) -> Self {
        Self::Flee(FleeState::new(threat))
    }

    /// Terminal state.
    #[must_use]
    pub fn dead() -> Self {
        Self::Dead(DeadState::default())
    }

    /// Discriminant.
    #[must_use]
    pub fn kind(&self) -> AiStateKind {
        match self {
            Self::Idle => AiStateKind::Idle,
            Self::Patrol(_) => AiStateKind::Patrol,
            Self::Chase(_) => AiStateKind::Chase,
            Self::Attack(_) => AiStateKind::Attack,
            Self::Strafe(_) => AiStateKind::Strafe,
            Self::Flee(_) => AiStateKind::Flee,
            Self::Dead(_) => AiStateKind::Dead,
        }
    }

    /// Whether the brain must leave this state alone.
    ///
    /// Attacks run to the end of recovery and a chase finishes its
    /// reaction delay before anything else is considered. Only death
    /// interrupts either.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        match self {
            Self::Attack(_) => true,
            Self::Chase(chase) => chase.is_reacting(),
            _ => false,
        }
    }

    /// Whether this is the terminal state.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead(_))
    }
}

// ============================================================================
// Execution context
// ============================================================================

/// Everything a state or brain may touch while running for one actor.
pub struct StateContext<'a> {
    /// The actor being driven.
    pub actor: &'a mut Actor,
    /// Target chosen by the brain this tick.
    pub target: Option<EntityId>,
    /// Scoped arbiter handle.
    pub arbiter: ArbiterAccess<'a>,
    /// Perception and damage delivery.
    pub world: &'a mut dyn WorldQuery,
    /// The actor's own random stream.
    pub rng: &'a mut AiRng,
    /// Event sink for this tick.
    pub events: &'a mut Vec<AiEvent>,
    /// Seconds per tick.
    pub dt: Fixed,
}

impl StateContext<'_> {
    /// Current view of the brain's target, if it is still alive.
    #[must_use]
    pub fn target_view(&self) -> Option<TargetView> {
        self.target
            .and_then(|id| self.world.target(id))
            .filter(|view| view.alive)
    }

    /// Record an event.
    pub fn emit(&mut self, event: AiEvent) {
        self.events.push(event);
    }

    /// Id of the actor being driven.
    #[must_use]
    pub fn actor_id(&self) -> EntityId {
        self.actor.id()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// What a state asks for after executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Keep running.
    Stay,
    /// Switch to another state.
    Change(AiState),
    /// Remove the actor.
    Despawn,
}

/// Why a state is being exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Normal transition requested by the brain or the state.
    Transition,
    /// Health reached zero. Movement cleanup is skipped; tokens are still
    /// released.
    Death,
}

/// Enter hook.
pub type EnterFn = fn(&mut AiState, &mut StateContext<'_>);
/// Execute hook.
pub type ExecuteFn = fn(&mut AiState, &mut StateContext<'_>) -> Transition;
/// Exit hook.
pub type ExitFn = fn(&mut AiState, &mut StateContext<'_>, ExitReason);

/// Dispatch table entry for one [`AiStateKind`].
#[derive(Clone, Copy)]
pub struct StateHandlers {
    /// Runs once when the state becomes active.
    pub enter: EnterFn,
    /// Runs once per tick while active.
    pub execute: ExecuteFn,
    /// Runs once when the state is replaced. Must be safe even if `enter`
    /// never ran.
    pub exit: ExitFn,
}

impl std::fmt::Debug for StateHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandlers").finish_non_exhaustive()
    }
}
