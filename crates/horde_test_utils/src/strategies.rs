//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of the arbiter and the simulation.

use horde_core::data::{presets, ActorConfig};
use horde_core::math::{Fixed, Vec2Fixed};
use horde_core::simulation::Simulation;
use proptest::prelude::*;

use crate::fixtures::{simulation, sturdy_target};

/// Generate a fixed-point coordinate in an arena-sized range.
///
/// Range: -20 to 20 in steps of 0.01
pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
    (-2000i32..2000i32).prop_map(|hundredths| Fixed::from_num(hundredths) / Fixed::from_num(100))
}

/// Generate a fixed-point 2D vector for positions.
pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
    (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
}

/// Pick one of the built-in presets.
pub fn arb_preset() -> impl Strategy<Value = ActorConfig> {
    prop::sample::select(presets::all())
}

/// Generate a separation radius (0.5 to 3).
pub fn arb_radius() -> impl Strategy<Value = Fixed> {
    (50i32..300i32).prop_map(|hundredths| Fixed::from_num(hundredths) / Fixed::from_num(100))
}

/// One actor placement.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    /// Behavior configuration.
    pub config: ActorConfig,
    /// Spawn point.
    pub position: Vec2Fixed,
}

/// Generate a single actor placement.
pub fn arb_spawn() -> impl Strategy<Value = SpawnSpec> {
    (arb_preset(), arb_vec2_position())
        .prop_map(|(config, position)| SpawnSpec { config, position })
}

/// Generate between one and `max_actors` placements.
pub fn arb_spawn_layout(max_actors: usize) -> impl Strategy<Value = Vec<SpawnSpec>> {
    proptest::collection::vec(arb_spawn(), 1..max_actors)
}

/// Build a simulation with a sturdy target at the origin and `layout`
/// spawned in order, using the default token capacity.
///
/// # Panics
///
/// Panics if a preset fails validation, which would be a bug in the
/// presets.
#[must_use]
pub fn build_layout(layout: &[SpawnSpec], seed: u64) -> Simulation {
    let mut sim = simulation(seed, horde_core::data::DEFAULT_TOKEN_CAPACITY);
    sim.spawn_target(&sturdy_target(), Vec2Fixed::ZERO)
        .expect("fixture target is valid");
    for placement in layout {
        sim.spawn_actor(placement.config.clone(), placement.position)
            .expect("presets are valid");
    }
    sim
}

/// An operation against the arbiter's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOp {
    /// Register (or refresh) an actor.
    Register(u64),
    /// Unregister an actor.
    Unregister(u64),
    /// Request a token.
    Request(u64),
    /// Release a token.
    Release(u64),
}

/// Generate a single arbiter operation over actor ids `0..8`.
pub fn arb_token_op() -> impl Strategy<Value = TokenOp> {
    prop_oneof![
        1 => (0u64..8).prop_map(TokenOp::Register),
        1 => (0u64..8).prop_map(TokenOp::Unregister),
        3 => (0u64..8).prop_map(TokenOp::Request),
        2 => (0u64..8).prop_map(TokenOp::Release),
    ]
}

/// Generate a sequence of arbiter operations.
pub fn arb_token_ops(max_len: usize) -> impl Strategy<Value = Vec<TokenOp>> {
    proptest::collection::vec(arb_token_op(), 0..max_len)
}
