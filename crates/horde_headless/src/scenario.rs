//! Scenario loading and configuration.
//!
//! A scenario describes the player-side targets, the actors hunting them, a
//! scripted timeline of world inputs, and the session settings (seed, tick
//! rate, token capacity, run length). Scenarios are RON files or one of the
//! built-ins returned by [`Scenario::builtin`].
//!
//! Timeline entries reference targets and actors by their index in the
//! scenario, not by runtime id: target `0` is the first entry of
//! `targets`, actor `0` is the first actor spawned from `actors`, and actors
//! spawned from the timeline are appended in timeline order.

use std::path::Path;

use horde_core::combat::DamageKind;
use horde_core::data::{
    presets, ActorConfig, ArbiterConfig, SimulationConfig, TargetConfig, DEFAULT_TICK_RATE,
    DEFAULT_TOKEN_CAPACITY,
};
use horde_core::error::AiError;
use horde_core::math::{Fixed, Vec2Fixed};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A placement names a preset that does not exist.
    #[error("Unknown actor preset: {0}")]
    UnknownPreset(String),
    /// Neither a built-in scenario nor an existing file.
    #[error("Unknown scenario '{0}' (not a built-in and no such file)")]
    UnknownScenario(String),
    /// A timeline entry points past the end of the roster.
    #[error("Timeline entry at tick {tick} references missing {kind} #{index}")]
    BadReference {
        /// Tick of the offending entry.
        tick: u64,
        /// "target" or "actor".
        kind: &'static str,
        /// Index that does not exist.
        index: usize,
    },
    /// The core rejected a configuration or replay.
    #[error(transparent)]
    Core(#[from] AiError),
    /// The batch worker pool could not start.
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
    /// Metrics could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for scenario and runner operations.
pub type ScenarioResult<T> = std::result::Result<T, ScenarioError>;

fn default_tick_rate() -> u32 {
    DEFAULT_TICK_RATE
}

fn default_capacity() -> u32 {
    DEFAULT_TOKEN_CAPACITY
}

fn default_ticks() -> u64 {
    // 30 seconds at the default rate
    1800
}

fn default_count() -> u32 {
    1
}

fn default_spacing() -> f64 {
    1.5
}

fn point((x, y): (f64, f64)) -> Vec2Fixed {
    Vec2Fixed::from_f64(x, y)
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, recorded in replays and metrics.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Session seed.
    #[serde(default)]
    pub seed: u64,
    /// Ticks per simulated second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Concurrent attack tokens.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Run length in ticks.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Player-side targets, spawned first.
    #[serde(default)]
    pub targets: Vec<TargetPlacement>,
    /// Actor groups, spawned after the targets.
    #[serde(default)]
    pub actors: Vec<ActorPlacement>,
    /// Scripted world inputs.
    #[serde(default)]
    pub timeline: Vec<ScriptedInput>,
}

/// Names accepted by [`Scenario::builtin`].
pub const BUILTIN_SCENARIOS: [&str; 3] = ["skirmish", "gauntlet", "stampede"];

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ScenarioResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> ScenarioResult<Self> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "skirmish" => Some(Self::skirmish()),
            "gauntlet" => Some(Self::gauntlet()),
            "stampede" => Some(Self::stampede()),
            _ => None,
        }
    }

    /// Resolve a built-in name first, then a file path.
    pub fn resolve(name_or_path: &str) -> ScenarioResult<Self> {
        if let Some(scenario) = Self::builtin(name_or_path) {
            return Ok(scenario);
        }
        if Path::new(name_or_path).exists() {
            return Self::load(name_or_path);
        }
        Err(ScenarioError::UnknownScenario(name_or_path.to_string()))
    }

    /// Same scenario with another seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Session settings for the core.
    #[must_use]
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            seed: self.seed,
            tick_rate: self.tick_rate,
            arbiter: ArbiterConfig {
                capacity: self.capacity,
            },
        }
    }

    /// Number of actors spawned before the first tick.
    #[must_use]
    pub fn initial_actor_count(&self) -> usize {
        self.actors.iter().map(|group| group.count as usize).sum()
    }

    /// Check presets, overrides, session settings, and timeline references.
    pub fn validate(&self) -> ScenarioResult<()> {
        self.simulation_config().validate()?;
        for target in &self.targets {
            target.config.validate()?;
        }
        for group in &self.actors {
            group.config()?;
        }

        let mut roster = self.initial_actor_count();
        for entry in &self.timeline {
            match &entry.action {
                ScriptAction::MoveTarget { target, .. }
                | ScriptAction::DamageTarget { target, .. }
                | ScriptAction::HealTarget { target, .. }
                | ScriptAction::RemoveTarget { target } => {
                    if *target >= self.targets.len() {
                        return Err(ScenarioError::BadReference {
                            tick: entry.tick,
                            kind: "target",
                            index: *target,
                        });
                    }
                }
                ScriptAction::DamageActor { actor, .. } | ScriptAction::RemoveActor { actor } => {
                    if *actor >= roster {
                        return Err(ScenarioError::BadReference {
                            tick: entry.tick,
                            kind: "actor",
                            index: *actor,
                        });
                    }
                }
                ScriptAction::SpawnActor { placement } => {
                    placement.config()?;
                    roster += placement.count as usize;
                }
            }
        }
        Ok(())
    }

    /// Six grunts flanking a single sturdy knight.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "skirmish".to_string(),
            description: "Six grunts contest two attack tokens around one knight".to_string(),
            seed: 0,
            tick_rate: DEFAULT_TICK_RATE,
            capacity: DEFAULT_TOKEN_CAPACITY,
            ticks: 1800,
            targets: vec![TargetPlacement::sturdy((0.0, 0.0), 400.0)],
            actors: vec![
                ActorPlacement::new("grunt", (0.0, 5.0), 3),
                ActorPlacement::new("grunt", (0.0, -5.0), 3),
            ],
            timeline: vec![
                ScriptedInput::new(
                    600,
                    ScriptAction::MoveTarget {
                        target: 0,
                        position: (3.0, 0.0),
                    },
                ),
                ScriptedInput::new(
                    900,
                    ScriptAction::DamageActor {
                        actor: 0,
                        amount: 90.0,
                        kind: DamageKind::Physical,
                    },
                ),
            ],
        }
    }

    /// Mixed melee, ranged and turret actors around a walking player.
    #[must_use]
    pub fn gauntlet() -> Self {
        let walk = [(2.0, 0.0), (4.0, 1.0), (6.0, 0.0), (8.0, -1.0), (10.0, 0.0)];
        let timeline = walk
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                ScriptedInput::new(
                    300 * (i as u64 + 1),
                    ScriptAction::MoveTarget {
                        target: 0,
                        position,
                    },
                )
            })
            .collect();

        Self {
            name: "gauntlet".to_string(),
            description: "Goblins, skeletons, a ranger and a tower along a walked path".to_string(),
            seed: 0,
            tick_rate: DEFAULT_TICK_RATE,
            capacity: DEFAULT_TOKEN_CAPACITY,
            ticks: 2400,
            targets: vec![TargetPlacement::sturdy((0.0, 0.0), 600.0)],
            actors: vec![
                ActorPlacement::new("goblin", (5.0, 3.0), 4),
                ActorPlacement::new("skeleton", (3.0, -6.0), 2),
                ActorPlacement::new("ranger", (-6.0, 0.0), 1),
                ActorPlacement::new("tower", (8.0, 6.0), 1),
            ],
            timeline,
        }
    }

    /// Chargers and mummies with casualties and reinforcements.
    #[must_use]
    pub fn stampede() -> Self {
        let mut timeline: Vec<ScriptedInput> = (0..3)
            .map(|actor| {
                ScriptedInput::new(
                    400 + 200 * actor as u64,
                    ScriptAction::DamageActor {
                        actor,
                        amount: 500.0,
                        kind: DamageKind::Fire,
                    },
                )
            })
            .collect();
        timeline.push(ScriptedInput::new(
            1200,
            ScriptAction::SpawnActor {
                placement: ActorPlacement::new("charger", (-6.0, 0.0), 3),
            },
        ));
        timeline.push(ScriptedInput::new(
            1500,
            ScriptAction::HealTarget {
                target: 0,
                amount: 100.0,
            },
        ));

        Self {
            name: "stampede".to_string(),
            description: "Three tokens, ten melee actors, scripted kills and reinforcements"
                .to_string(),
            seed: 0,
            tick_rate: DEFAULT_TICK_RATE,
            capacity: 3,
            ticks: 2400,
            targets: vec![TargetPlacement::sturdy((0.0, 0.0), 800.0)],
            actors: vec![
                ActorPlacement::new("charger", (0.0, 4.0), 6),
                ActorPlacement::new("mummy", (0.0, -4.0), 4),
            ],
            timeline,
        }
    }
}

/// A player-side target at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPlacement {
    /// Position (x, y).
    pub position: (f64, f64),
    /// Health and armor; defaults to an armored knight.
    #[serde(default)]
    pub config: TargetConfig,
}

impl TargetPlacement {
    /// Unarmored target with `max_health` and no invincibility window.
    #[must_use]
    pub fn sturdy(position: (f64, f64), max_health: f64) -> Self {
        Self {
            position,
            config: TargetConfig {
                max_health: Fixed::from_num(max_health),
                armor: None,
                invincibility_duration: Fixed::ZERO,
            },
        }
    }

    /// Spawn point in simulation space.
    #[must_use]
    pub fn spawn_point(&self) -> Vec2Fixed {
        point(self.position)
    }
}

/// A group of identical actors laid out in a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorPlacement {
    /// Preset name (see `horde_core::data::presets`).
    pub preset: String,
    /// Center of the row (x, y).
    pub position: (f64, f64),
    /// Number of actors.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Distance between neighbors along x.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Per-group tweaks on top of the preset.
    #[serde(default)]
    pub overrides: ActorOverrides,
}

impl ActorPlacement {
    /// `count` actors of `preset` centered on `position`.
    #[must_use]
    pub fn new(preset: impl Into<String>, position: (f64, f64), count: u32) -> Self {
        Self {
            preset: preset.into(),
            position,
            count,
            spacing: default_spacing(),
            overrides: ActorOverrides::default(),
        }
    }

    /// Resolved and validated configuration for this group.
    pub fn config(&self) -> ScenarioResult<ActorConfig> {
        let base = presets::by_name(&self.preset)
            .ok_or_else(|| ScenarioError::UnknownPreset(self.preset.clone()))?;
        let config = self.overrides.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Spawn points, left to right.
    #[must_use]
    pub fn spawn_points(&self) -> Vec<Vec2Fixed> {
        let (cx, cy) = self.position;
        let half_width = f64::from(self.count.saturating_sub(1)) * self.spacing / 2.0;
        (0..self.count)
            .map(|i| point((cx - half_width + f64::from(i) * self.spacing, cy)))
            .collect()
    }
}

/// Optional replacements for preset fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorOverrides {
    /// Display name.
    pub name: Option<String>,
    /// Units per second.
    pub move_speed: Option<f64>,
    /// Health points.
    pub max_health: Option<f64>,
    /// Damage per landed attack.
    pub attack_damage: Option<f64>,
    /// Attack reach.
    pub attack_range: Option<f64>,
    /// Seconds between attacks.
    pub attack_cooldown: Option<f64>,
    /// Seconds of windup.
    pub windup_time: Option<f64>,
    /// Acquire radius.
    pub detection_range: Option<f64>,
    /// Release radius.
    pub lose_range: Option<f64>,
    /// Health fraction below which the actor flees.
    pub flee_health_threshold: Option<f64>,
    /// Ranged stand-off distance.
    pub preferred_distance: Option<f64>,
    /// Whether the actor attacks from range.
    pub ranged: Option<bool>,
    /// Disable patrolling.
    pub stationary: Option<bool>,
}

fn set(field: &mut Fixed, value: Option<f64>) {
    if let Some(value) = value {
        *field = Fixed::from_num(value);
    }
}

impl ActorOverrides {
    /// Apply the overrides on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: ActorConfig) -> ActorConfig {
        if let Some(name) = &self.name {
            config.name.clone_from(name);
        }
        set(&mut config.move_speed, self.move_speed);
        set(&mut config.max_health, self.max_health);
        set(&mut config.attack_damage, self.attack_damage);
        set(&mut config.attack_range, self.attack_range);
        set(&mut config.attack_cooldown, self.attack_cooldown);
        set(&mut config.windup_time, self.windup_time);
        set(&mut config.detection_range, self.detection_range);
        set(&mut config.lose_range, self.lose_range);
        set(&mut config.flee_health_threshold, self.flee_health_threshold);
        set(&mut config.preferred_distance, self.preferred_distance);
        if let Some(ranged) = self.ranged {
            config.ranged = ranged;
        }
        if self.stationary == Some(true) {
            config.patrol = None;
        }
        config
    }
}

/// A world input scheduled before a given tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Applied before this tick runs.
    pub tick: u64,
    /// What happens.
    pub action: ScriptAction,
}

impl ScriptedInput {
    /// Schedule `action` before `tick`.
    #[must_use]
    pub fn new(tick: u64, action: ScriptAction) -> Self {
        Self { tick, action }
    }
}

/// Scripted world inputs, addressed by scenario index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScriptAction {
    /// Teleport a target.
    MoveTarget {
        /// Target index.
        target: usize,
        /// New position.
        position: (f64, f64),
    },
    /// Hit a target from outside the AI.
    DamageTarget {
        /// Target index.
        target: usize,
        /// Damage amount.
        amount: f64,
        /// Damage kind.
        #[serde(default)]
        kind: DamageKind,
    },
    /// Restore target health.
    HealTarget {
        /// Target index.
        target: usize,
        /// Health to restore.
        amount: f64,
    },
    /// Remove a target.
    RemoveTarget {
        /// Target index.
        target: usize,
    },
    /// Player weapon hit on an actor.
    DamageActor {
        /// Actor index.
        actor: usize,
        /// Damage amount.
        amount: f64,
        /// Damage kind.
        #[serde(default)]
        kind: DamageKind,
    },
    /// Remove an actor immediately.
    RemoveActor {
        /// Actor index.
        actor: usize,
    },
    /// Spawn reinforcements.
    SpawnActor {
        /// The new group.
        placement: ActorPlacement,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_validate() {
        for name in BUILTIN_SCENARIOS {
            let scenario = Scenario::builtin(name).unwrap();
            assert_eq!(scenario.name, name);
            scenario.validate().unwrap();
        }
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_from_ron_with_defaults() {
        let ron = r#"
            Scenario(
                name: "Test",
                targets: [(position: (0.0, 0.0))],
                actors: [
                    (preset: "goblin", position: (4.0, 0.0), count: 3),
                    (preset: "tower", position: (0.0, 6.0), overrides: (attack_damage: Some(2.5))),
                ],
                timeline: [
                    (tick: 10, action: MoveTarget(target: 0, position: (1.0, 1.0))),
                    (tick: 20, action: DamageActor(actor: 3, amount: 50.0, kind: Fire)),
                ],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.tick_rate, DEFAULT_TICK_RATE);
        assert_eq!(scenario.capacity, DEFAULT_TOKEN_CAPACITY);
        assert_eq!(scenario.initial_actor_count(), 4);
        assert_eq!(scenario.targets[0].config, TargetConfig::default());
        let tower = scenario.actors[1].config().unwrap();
        assert_eq!(tower.attack_damage, Fixed::from_num(2.5));
        scenario.validate().unwrap();
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let mut scenario = Scenario::skirmish();
        scenario.actors[0].preset = "dragon".to_string();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownPreset(name)) if name == "dragon"
        ));
    }

    #[test]
    fn test_bad_timeline_reference_rejected() {
        let mut scenario = Scenario::skirmish();
        scenario.timeline.push(ScriptedInput::new(
            5,
            ScriptAction::RemoveActor { actor: 6 },
        ));
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::BadReference { kind: "actor", index: 6, .. })
        ));

        // Reinforcements extend the roster.
        let mut scenario = Scenario::stampede();
        scenario.timeline.push(ScriptedInput::new(
            2000,
            ScriptAction::RemoveActor { actor: 12 },
        ));
        scenario.validate().unwrap();
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut scenario = Scenario::skirmish();
        scenario.actors[0].overrides.lose_range = Some(1.0);
        assert!(matches!(scenario.validate(), Err(ScenarioError::Core(_))));
    }

    #[test]
    fn test_row_layout_is_centered() {
        let placement = ActorPlacement {
            spacing: 2.0,
            ..ActorPlacement::new("grunt", (1.0, 3.0), 3)
        };
        assert_eq!(
            placement.spawn_points(),
            vec![
                Vec2Fixed::from_ints(-1, 3),
                Vec2Fixed::from_ints(1, 3),
                Vec2Fixed::from_ints(3, 3),
            ]
        );
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(matches!(
            Scenario::resolve("definitely/not/here.ron"),
            Err(ScenarioError::UnknownScenario(_))
        ));
        assert!(Scenario::resolve("gauntlet").is_ok());
    }

    #[test]
    fn test_bundled_scenario_files_validate() {
        let sources = [
            include_str!("../scenarios/ambush.ron"),
            include_str!("../scenarios/siege.ron"),
        ];
        for source in sources {
            let scenario = Scenario::from_ron_str(source).unwrap();
            scenario.validate().unwrap();
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Scenario::load("missing.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
