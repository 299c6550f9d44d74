//! Per-actor configuration.
//!
//! Every enemy flavor is a value of [`ActorConfig`]; there is no subclass
//! hierarchy. Fields are written as decimals in RON and converted to
//! fixed-point once at load time.

use serde::{Deserialize, Serialize};

use crate::combat::DamageKind;
use crate::error::{AiError, Result};
use crate::math::{decimal_serde, Fixed};

fn num(value: f64) -> Fixed {
    Fixed::from_num(value)
}

/// Patrol behavior around the spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Maximum distance from the spawn point for patrol destinations.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,
    /// Base pause between destinations, jittered by ±0.5s.
    #[serde(with = "decimal_serde")]
    pub wait_time: Fixed,
    /// Distance at which a destination counts as reached.
    #[serde(with = "decimal_serde")]
    pub arrival_tolerance: Fixed,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            radius: num(5.0),
            wait_time: num(2.0),
            arrival_tolerance: num(0.3),
        }
    }
}

/// Orbiting behavior used while waiting for an attack token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrafeConfig {
    /// Shortest time before the orbit direction flips.
    #[serde(with = "decimal_serde")]
    pub min_duration: Fixed,
    /// Longest time before the orbit direction flips.
    #[serde(with = "decimal_serde")]
    pub max_duration: Fixed,
    /// Fraction of move speed used while orbiting.
    #[serde(with = "decimal_serde")]
    pub speed_multiplier: Fixed,
    /// Tolerated deviation from the stand-off distance before correcting.
    #[serde(with = "decimal_serde")]
    pub distance_band: Fixed,
    /// Weight of the radial correction relative to the tangent.
    #[serde(with = "decimal_serde")]
    pub radial_weight: Fixed,
    /// Extra distance past the engagement radius before giving up and chasing.
    #[serde(with = "decimal_serde")]
    pub leash_margin: Fixed,
}

impl Default for StrafeConfig {
    fn default() -> Self {
        Self {
            min_duration: num(1.0),
            max_duration: num(3.0),
            speed_multiplier: num(0.8),
            distance_band: num(0.25),
            radial_weight: num(0.5),
            leash_margin: num(1.5),
        }
    }
}

/// Armor pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorConfig {
    /// Armor points.
    #[serde(with = "decimal_serde")]
    pub max: Fixed,
    /// Seconds without a hit before regeneration starts.
    #[serde(with = "decimal_serde")]
    pub regen_delay: Fixed,
    /// Points regenerated per second.
    #[serde(with = "decimal_serde")]
    pub regen_rate: Fixed,
}

impl Default for ArmorConfig {
    fn default() -> Self {
        Self {
            max: num(7.0),
            regen_delay: num(3.0),
            regen_rate: num(0.5),
        }
    }
}

/// Energy pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Energy points.
    #[serde(with = "decimal_serde")]
    pub max: Fixed,
    /// Points regenerated per second.
    #[serde(with = "decimal_serde")]
    pub regen_rate: Fixed,
    /// Seconds after spending before regeneration starts.
    #[serde(with = "decimal_serde")]
    pub regen_delay: Fixed,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: num(100.0),
            regen_rate: num(5.0),
            regen_delay: num(1.0),
        }
    }
}

/// Complete behavior and stat configuration for one actor.
///
/// # Example RON
///
/// ```ron
/// ActorConfig(
///     name: "goblin",
///     move_speed: 4.0,
///     attack_damage: 8.0,
///     attack_range: 1.2,
///     attack_cooldown: 0.8,
///     reaction_time: 0.3,
///     detection_range: 6.0,
///     lose_range: 9.0,
/// )
/// ```
///
/// Omitted fields take the `grunt` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Preset or display name.
    pub name: String,

    /// Movement speed in units per second.
    #[serde(with = "decimal_serde")]
    pub move_speed: Fixed,

    /// Maximum health points.
    #[serde(with = "decimal_serde")]
    pub max_health: Fixed,
    /// Optional armor pool in front of health.
    pub armor: Option<ArmorConfig>,
    /// Invincibility window opened by each landed hit.
    #[serde(with = "decimal_serde")]
    pub invincibility_duration: Fixed,
    /// Scale applied to incoming damage.
    #[serde(with = "decimal_serde")]
    pub damage_multiplier: Fixed,

    /// Optional energy pool.
    pub energy: Option<EnergyConfig>,
    /// Energy spent per resolved attack (requires an energy pool).
    #[serde(with = "decimal_serde")]
    pub attack_energy_cost: Fixed,

    /// Radius within which a target is acquired.
    #[serde(with = "decimal_serde")]
    pub detection_range: Fixed,
    /// Radius beyond which a held target is dropped. Must exceed `detection_range`.
    #[serde(with = "decimal_serde")]
    pub lose_range: Fixed,

    /// Reach of an attack.
    #[serde(with = "decimal_serde")]
    pub attack_range: Fixed,
    /// Damage of one attack.
    #[serde(with = "decimal_serde")]
    pub attack_damage: Fixed,
    /// Damage classification of attacks.
    pub damage_kind: DamageKind,
    /// Knockback impulse magnitude of attacks.
    #[serde(with = "decimal_serde")]
    pub knockback: Fixed,
    /// Seconds between attacks, counted from the moment the windup resolves.
    #[serde(with = "decimal_serde")]
    pub attack_cooldown: Fixed,
    /// Commit delay before a hit resolves.
    #[serde(with = "decimal_serde")]
    pub windup_time: Fixed,
    /// Hold after a hit before the token is released.
    #[serde(with = "decimal_serde")]
    pub recovery_time: Fixed,
    /// Surprise delay after spotting a target.
    #[serde(with = "decimal_serde")]
    pub reaction_time: Fixed,

    /// Health fraction below which the actor flees.
    #[serde(with = "decimal_serde")]
    pub flee_health_threshold: Fixed,
    /// Seconds spent fleeing.
    #[serde(with = "decimal_serde")]
    pub flee_duration: Fixed,
    /// Speed boost while fleeing.
    #[serde(with = "decimal_serde")]
    pub flee_speed_multiplier: Fixed,

    /// Whether the actor attacks from a distance.
    pub ranged: bool,
    /// Stand-off distance kept by ranged actors.
    #[serde(with = "decimal_serde")]
    pub preferred_distance: Fixed,

    /// Patrol behavior; `None` idles in place.
    pub patrol: Option<PatrolConfig>,
    /// Neighbor radius used for separation while chasing.
    #[serde(with = "decimal_serde")]
    pub separation_radius: Fixed,
    /// Orbit settings.
    pub strafe: StrafeConfig,

    /// Seconds between death and removal.
    #[serde(with = "decimal_serde")]
    pub despawn_delay: Fixed,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: "grunt".to_string(),
            move_speed: num(3.0),
            max_health: num(100.0),
            armor: None,
            invincibility_duration: num(0.5),
            damage_multiplier: Fixed::ONE,
            energy: None,
            attack_energy_cost: Fixed::ZERO,
            detection_range: num(8.0),
            lose_range: num(12.0),
            attack_range: num(1.5),
            attack_damage: num(10.0),
            damage_kind: DamageKind::Physical,
            knockback: num(3.0),
            attack_cooldown: num(1.0),
            windup_time: num(0.5),
            recovery_time: num(1.0),
            reaction_time: num(0.5),
            flee_health_threshold: num(0.2),
            flee_duration: num(3.0),
            flee_speed_multiplier: num(1.5),
            ranged: false,
            preferred_distance: num(2.0),
            patrol: Some(PatrolConfig::default()),
            separation_radius: num(1.0),
            strafe: StrafeConfig::default(),
            despawn_delay: num(1.0),
        }
    }
}

impl ActorConfig {
    /// Distance the actor tries to hold while orbiting a target.
    ///
    /// A ranged actor holds its preferred distance, pulled in so the whole
    /// strafe band stays within attack range.
    #[must_use]
    pub fn stand_off_distance(&self) -> Fixed {
        if self.ranged {
            let reach = (self.attack_range - self.strafe.distance_band).max(Fixed::ZERO);
            self.preferred_distance.min(reach)
        } else {
            self.attack_range * num(0.8)
        }
    }

    /// Distance past which a strafing actor breaks off and chases.
    #[must_use]
    pub fn strafe_leash(&self) -> Fixed {
        self.stand_off_distance().max(self.attack_range) + self.strafe.leash_margin
    }

    /// Reject configurations that would make the behavior ill-defined.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("move_speed", self.move_speed),
            ("invincibility_duration", self.invincibility_duration),
            ("damage_multiplier", self.damage_multiplier),
            ("attack_energy_cost", self.attack_energy_cost),
            ("detection_range", self.detection_range),
            ("attack_damage", self.attack_damage),
            ("knockback", self.knockback),
            ("attack_cooldown", self.attack_cooldown),
            ("windup_time", self.windup_time),
            ("recovery_time", self.recovery_time),
            ("reaction_time", self.reaction_time),
            ("flee_duration", self.flee_duration),
            ("flee_speed_multiplier", self.flee_speed_multiplier),
            ("preferred_distance", self.preferred_distance),
            ("separation_radius", self.separation_radius),
            ("despawn_delay", self.despawn_delay),
            ("strafe.min_duration", self.strafe.min_duration),
            ("strafe.max_duration", self.strafe.max_duration),
            ("strafe.speed_multiplier", self.strafe.speed_multiplier),
            ("strafe.distance_band", self.strafe.distance_band),
            ("strafe.radial_weight", self.strafe.radial_weight),
            ("strafe.leash_margin", self.strafe.leash_margin),
        ];
        for (field, value) in non_negative {
            if value < Fixed::ZERO {
                return Err(AiError::invalid(field, "must not be negative"));
            }
        }

        if self.max_health <= Fixed::ZERO {
            return Err(AiError::invalid("max_health", "must be positive"));
        }
        if self.attack_range <= Fixed::ZERO {
            return Err(AiError::invalid("attack_range", "must be positive"));
        }
        if self.lose_range <= self.detection_range {
            return Err(AiError::invalid(
                "lose_range",
                "must be greater than detection_range",
            ));
        }
        if self.flee_health_threshold < Fixed::ZERO || self.flee_health_threshold > Fixed::ONE {
            return Err(AiError::invalid(
                "flee_health_threshold",
                "must lie within [0, 1]",
            ));
        }
        if self.strafe.min_duration > self.strafe.max_duration {
            return Err(AiError::invalid(
                "strafe.min_duration",
                "must not exceed strafe.max_duration",
            ));
        }
        if let Some(patrol) = &self.patrol {
            if patrol.radius < Fixed::ZERO
                || patrol.wait_time < Fixed::ZERO
                || patrol.arrival_tolerance < Fixed::ZERO
            {
                return Err(AiError::invalid("patrol", "values must not be negative"));
            }
        }
        if let Some(armor) = &self.armor {
            if armor.max < Fixed::ZERO
                || armor.regen_delay < Fixed::ZERO
                || armor.regen_rate < Fixed::ZERO
            {
                return Err(AiError::invalid("armor", "values must not be negative"));
            }
        }
        if let Some(energy) = &self.energy {
            if energy.max < Fixed::ZERO
                || energy.regen_delay < Fixed::ZERO
                || energy.regen_rate < Fixed::ZERO
            {
                return Err(AiError::invalid("energy", "values must not be negative"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ActorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_lose_range_must_exceed_detection() {
        let config = ActorConfig {
            lose_range: num(8.0),
            ..ActorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AiError::InvalidConfig { ref field, .. } if field == "lose_range"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            ActorConfig {
                attack_range: Fixed::ZERO,
                ..ActorConfig::default()
            },
            ActorConfig {
                max_health: Fixed::ZERO,
                ..ActorConfig::default()
            },
            ActorConfig {
                flee_health_threshold: num(1.5),
                ..ActorConfig::default()
            },
            ActorConfig {
                move_speed: num(-1.0),
                ..ActorConfig::default()
            },
            ActorConfig {
                strafe: StrafeConfig {
                    min_duration: num(4.0),
                    ..StrafeConfig::default()
                },
                ..ActorConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "accepted {config:?}");
        }
    }

    #[test]
    fn test_stand_off_distance() {
        let melee = ActorConfig::default();
        assert_eq!(melee.stand_off_distance(), num(1.5) * num(0.8));
        assert_eq!(melee.strafe_leash(), num(1.5) + num(1.5));

        let ranged = ActorConfig {
            ranged: true,
            attack_range: num(7.0),
            preferred_distance: num(4.0),
            ..ActorConfig::default()
        };
        assert_eq!(ranged.stand_off_distance(), num(4.0));
        assert_eq!(ranged.strafe_leash(), num(7.0) + num(1.5));

        let outranged = ActorConfig {
            preferred_distance: num(6.0),
            attack_range: num(3.0),
            ..ranged
        };
        assert_eq!(outranged.stand_off_distance(), num(3.0) - num(0.25));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: ActorConfig =
            ron::from_str("(name: \"brute\", move_speed: 2.5, attack_damage: 20.0)").unwrap();
        assert_eq!(config.name, "brute");
        assert_eq!(config.move_speed, num(2.5));
        assert_eq!(config.attack_damage, num(20.0));
        assert_eq!(config.lose_range, num(12.0));
        assert!(config.validate().is_ok());
    }
}
