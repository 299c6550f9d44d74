//! Test fixtures and helpers.
//!
//! Pre-built arenas and configurations for consistent testing.

use fixed::types::I32F32;
use horde_core::data::{presets, ActorConfig, ArbiterConfig, SimulationConfig, TargetConfig};
use horde_core::events::AiEvent;
use horde_core::math::Vec2Fixed;
use horde_core::simulation::Simulation;
use horde_core::states::AiStateKind;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a vector from float coordinates (for tests only).
#[must_use]
pub fn vec2(x: f64, y: f64) -> Vec2Fixed {
    Vec2Fixed::from_f64(x, y)
}

/// A target that survives any reasonable test: 1000 health, no armor and no
/// invincibility window, so every landed hit is visible in its health.
#[must_use]
pub fn sturdy_target() -> TargetConfig {
    TargetConfig {
        max_health: fixed(1000),
        armor: None,
        invincibility_duration: I32F32::ZERO,
    }
}

/// Grunt that neither patrols nor flees, for scenarios where only combat
/// matters.
#[must_use]
pub fn brawler() -> ActorConfig {
    ActorConfig {
        name: "brawler".to_string(),
        patrol: None,
        flee_health_threshold: I32F32::ZERO,
        ..presets::grunt()
    }
}

/// Simulation with the given seed and token capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn simulation(seed: u64, capacity: u32) -> Simulation {
    let config = SimulationConfig {
        arbiter: ArbiterConfig { capacity },
        ..SimulationConfig::with_seed(seed)
    };
    Simulation::new(config).expect("fixture config is valid")
}

/// `count` points evenly spaced on a circle.
#[must_use]
pub fn ring(center: Vec2Fixed, radius: f64, count: usize) -> Vec<Vec2Fixed> {
    let (cx, cy) = center.to_f64();
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            vec2(cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// An arena of actors crowding a single target.
#[derive(Debug)]
pub struct Arena {
    /// The simulation.
    pub sim: Simulation,
    /// The lone target, at the origin.
    pub target: u64,
    /// Actor ids in spawn order.
    pub actors: Vec<u64>,
}

impl Arena {
    /// `count` copies of `config` on a ring of `radius` around a sturdy
    /// target at the origin.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid or `capacity` is zero.
    #[must_use]
    pub fn ring(
        config: &ActorConfig,
        count: usize,
        radius: f64,
        capacity: u32,
        seed: u64,
    ) -> Self {
        let mut sim = simulation(seed, capacity);
        let target = sim
            .spawn_target(&sturdy_target(), Vec2Fixed::ZERO)
            .expect("fixture target is valid");
        let actors = ring(Vec2Fixed::ZERO, radius, count)
            .into_iter()
            .map(|position| {
                sim.spawn_actor(config.clone(), position)
                    .expect("fixture actor is valid")
            })
            .collect();
        Self {
            sim,
            target,
            actors,
        }
    }

    /// Actors currently in `kind`, in id order.
    #[must_use]
    pub fn in_state(&self, kind: AiStateKind) -> Vec<u64> {
        self.actors
            .iter()
            .copied()
            .filter(|id| self.sim.state(*id).map(|s| s.kind()) == Some(kind))
            .collect()
    }
}

/// Count events matching `predicate`.
pub fn count_events(events: &[AiEvent], predicate: impl Fn(&AiEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}
