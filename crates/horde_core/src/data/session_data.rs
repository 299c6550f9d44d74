//! Session-wide configuration: arbiter capacity, tick rate, seed, and the
//! player-side targets actors hunt.

use serde::{Deserialize, Serialize};

use crate::data::ArmorConfig;
use crate::error::{AiError, Result};
use crate::math::{decimal_serde, Fixed};

/// Default number of concurrent attack tokens.
pub const DEFAULT_TOKEN_CAPACITY: u32 = 2;

/// Default simulation rate.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Attack arbiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Maximum number of actors allowed in Attack at once.
    pub capacity: u32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TOKEN_CAPACITY,
        }
    }
}

impl ArbiterConfig {
    /// Reject a zero capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] when `capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(AiError::invalid("arbiter.capacity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Top-level session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Session seed; every actor's random stream derives from it.
    pub seed: u64,
    /// Fixed steps per simulated second.
    pub tick_rate: u32,
    /// Attack arbiter settings.
    pub arbiter: ArbiterConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_rate: DEFAULT_TICK_RATE,
            arbiter: ArbiterConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Config with the given seed and default everything else.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> Fixed {
        Fixed::ONE / Fixed::from_num(self.tick_rate.max(1))
    }

    /// Validate the session and its arbiter.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] for a zero tick rate or capacity.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(AiError::invalid("tick_rate", "must be at least 1"));
        }
        self.arbiter.validate()
    }
}

/// A player-side target that actors perceive and attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Maximum health points.
    #[serde(with = "decimal_serde")]
    pub max_health: Fixed,
    /// Optional armor pool.
    pub armor: Option<ArmorConfig>,
    /// Invincibility window after each landed hit.
    #[serde(with = "decimal_serde")]
    pub invincibility_duration: Fixed,
}

impl Default for TargetConfig {
    /// A knight: 6 health behind 7 regenerating armor.
    fn default() -> Self {
        Self {
            max_health: Fixed::from_num(6),
            armor: Some(ArmorConfig::default()),
            invincibility_duration: Fixed::from_num(0.5),
        }
    }
}

impl TargetConfig {
    /// Reject targets that would spawn dead.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] for non-positive health or a
    /// negative duration.
    pub fn validate(&self) -> Result<()> {
        if self.max_health <= Fixed::ZERO {
            return Err(AiError::invalid("target.max_health", "must be positive"));
        }
        if self.invincibility_duration < Fixed::ZERO {
            return Err(AiError::invalid(
                "target.invincibility_duration",
                "must not be negative",
            ));
        }
        Ok(())
    }
}
