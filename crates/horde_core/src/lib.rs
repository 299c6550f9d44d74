//! # Horde Core
//!
//! Deterministic hostile-actor AI: per-actor state machines, a decision
//! brain with perception hysteresis, steering, and a session-wide attack
//! arbiter that caps how many actors may attack at once.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering or physics (states emit a velocity intent)
//! - No IO besides explicit replay save/load
//! - No unseeded randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`states`] - Behavior states and their dispatch table
//! - [`fsm`] - State machine core
//! - [`brain`] - Perception and decision policy
//! - [`arbiter`] - Attack token pool and live registry
//! - [`steering`] - Seek, flee, separation, orbit
//! - [`simulation`] - Core simulation loop
//! - [`data`] - RON-loadable configuration and presets
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actor;
pub mod arbiter;
pub mod brain;
pub mod combat;
pub mod components;
pub mod data;
pub mod error;
pub mod events;
pub mod fsm;
pub mod math;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod states;
pub mod steering;
pub mod timer;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actor::Actor;
    pub use crate::arbiter::{Arbiter, ArbiterAccess};
    pub use crate::brain::Brain;
    pub use crate::combat::{DamageInstance, DamageKind, DamageOutcome, Damageable};
    pub use crate::components::{EntityId, Health};
    pub use crate::data::{presets, ActorConfig, ArbiterConfig, SimulationConfig, TargetConfig};
    pub use crate::error::{AiError, Result};
    pub use crate::events::AiEvent;
    pub use crate::fsm::StateMachine;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::replay::{Recorder, Replay, WorldInput};
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::states::{AiState, AiStateKind};
    pub use crate::world::{TargetRegistry, TargetView, WorldQuery};
}
