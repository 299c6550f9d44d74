//! Configuration data for actors and sessions.
//!
//! Pure data structures deserialized from RON. This module performs no
//! IO; callers hand it strings and it hands back validated values.

mod actor_data;
mod session_data;

pub mod presets;

pub use actor_data::{ActorConfig, ArmorConfig, EnergyConfig, PatrolConfig, StrafeConfig};
pub use session_data::{
    ArbiterConfig, SimulationConfig, TargetConfig, DEFAULT_TICK_RATE, DEFAULT_TOKEN_CAPACITY,
};
