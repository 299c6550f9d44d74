//! Built-in enemy flavors expressed as configuration data.

use crate::data::ActorConfig;
use crate::error::{AiError, Result};
use crate::math::Fixed;

/// Names accepted by [`by_name`], in listing order.
pub const PRESET_NAMES: [&str; 7] = [
    "grunt", "goblin", "mummy", "skeleton", "ranger", "charger", "tower",
];

fn num(value: f64) -> Fixed {
    Fixed::from_num(value)
}

/// Baseline melee actor.
#[must_use]
pub fn grunt() -> ActorConfig {
    ActorConfig::default()
}

/// Fast, quick to react, light hitting melee.
#[must_use]
pub fn goblin() -> ActorConfig {
    ActorConfig {
        name: "goblin".to_string(),
        move_speed: num(4.0),
        attack_damage: num(8.0),
        attack_range: num(1.2),
        attack_cooldown: num(0.8),
        detection_range: num(6.0),
        lose_range: num(9.0),
        reaction_time: num(0.3),
        ..ActorConfig::default()
    }
}

/// Slow melee with a short windup.
#[must_use]
pub fn mummy() -> ActorConfig {
    ActorConfig {
        name: "mummy".to_string(),
        move_speed: num(2.5),
        attack_damage: num(12.0),
        attack_range: num(1.2),
        attack_cooldown: num(1.2),
        windup_time: num(0.3),
        detection_range: num(6.0),
        lose_range: num(9.0),
        ..ActorConfig::default()
    }
}

/// Ranged actor that keeps four units away.
#[must_use]
pub fn skeleton() -> ActorConfig {
    ActorConfig {
        name: "skeleton".to_string(),
        move_speed: num(2.5),
        attack_damage: num(6.0),
        attack_range: num(7.0),
        attack_cooldown: num(1.5),
        detection_range: num(8.0),
        lose_range: num(12.0),
        reaction_time: num(0.5),
        ranged: true,
        preferred_distance: num(4.0),
        knockback: Fixed::ZERO,
        ..ActorConfig::default()
    }
}

/// Ranged actor that keeps five units away.
#[must_use]
pub fn ranger() -> ActorConfig {
    ActorConfig {
        name: "ranger".to_string(),
        move_speed: num(2.0),
        attack_damage: num(8.0),
        attack_range: num(6.0),
        attack_cooldown: num(1.5),
        detection_range: num(8.0),
        lose_range: num(12.0),
        ranged: true,
        preferred_distance: num(5.0),
        knockback: Fixed::ZERO,
        ..ActorConfig::default()
    }
}

/// Heavy contact-damage melee.
#[must_use]
pub fn charger() -> ActorConfig {
    ActorConfig {
        name: "charger".to_string(),
        move_speed: num(3.0),
        attack_damage: num(15.0),
        attack_range: num(0.5),
        attack_cooldown: num(2.0),
        windup_time: num(0.3),
        detection_range: num(7.0),
        lose_range: num(10.5),
        separation_radius: num(0.5),
        ..ActorConfig::default()
    }
}

/// Stationary long-range turret. Never patrols or flees.
#[must_use]
pub fn tower() -> ActorConfig {
    ActorConfig {
        name: "tower".to_string(),
        move_speed: Fixed::ZERO,
        attack_damage: num(6.0),
        attack_range: num(10.0),
        attack_cooldown: num(2.0),
        detection_range: num(10.0),
        lose_range: num(15.0),
        flee_health_threshold: Fixed::ZERO,
        ranged: true,
        preferred_distance: Fixed::ZERO,
        patrol: None,
        knockback: Fixed::ZERO,
        ..ActorConfig::default()
    }
}

/// Look up a built-in preset.
#[must_use]
pub fn by_name(name: &str) -> Option<ActorConfig> {
    match name {
        "grunt" => Some(grunt()),
        "goblin" => Some(goblin()),
        "mummy" => Some(mummy()),
        "skeleton" => Some(skeleton()),
        "ranger" => Some(ranger()),
        "charger" => Some(charger()),
        "tower" => Some(tower()),
        _ => None,
    }
}

/// Every built-in preset, in [`PRESET_NAMES`] order.
#[must_use]
pub fn all() -> Vec<ActorConfig> {
    PRESET_NAMES.iter().filter_map(|name| by_name(name)).collect()
}

/// Parse and validate a single actor configuration.
///
/// `origin` names the source (usually a file path) in error messages.
///
/// # Errors
///
/// Returns [`AiError::DataParseError`] on malformed RON and
/// [`AiError::InvalidConfig`] when the parsed values are rejected.
pub fn from_ron_str(source: &str, origin: &str) -> Result<ActorConfig> {
    let config: ActorConfig = ron::from_str(source).map_err(|err| AiError::DataParseError {
        path: origin.to_string(),
        message: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a list of actor configurations.
///
/// # Errors
///
/// Same as [`from_ron_str`], for the first failing entry.
pub fn list_from_ron_str(source: &str, origin: &str) -> Result<Vec<ActorConfig>> {
    let configs: Vec<ActorConfig> = ron::from_str(source).map_err(|err| AiError::DataParseError {
        path: origin.to_string(),
        message: err.to_string(),
    })?;
    for config in &configs {
        config.validate()?;
    }
    Ok(configs)
}
