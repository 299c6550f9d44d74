//! Actor model: the entity data an AI state machine drives.

use serde::{Deserialize, Serialize};

use crate::combat::{DamageInstance, DamageOutcome, Damageable};
use crate::components::{ArmorPool, Energy, EntityId, Health};
use crate::data::ActorConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::timer::Timer;

/// An entity driven by the AI core.
///
/// States write the velocity intent and facing; the external physics layer
/// (or [`crate::simulation::Simulation::integrate_motion`]) applies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: EntityId,
    config: ActorConfig,
    /// World position.
    pub position: Vec2Fixed,
    home: Vec2Fixed,
    /// Desired velocity in units per second.
    pub velocity: Vec2Fixed,
    /// Unit direction the actor faces.
    pub facing: Vec2Fixed,
    /// Health record.
    pub health: Health,
    /// Energy record, if the actor spends energy on attacks.
    pub energy: Option<Energy>,
    /// Time until the next attack may start.
    pub attack_cooldown: Timer,
    /// Whether the actor still collides and can be interacted with.
    pub collision_enabled: bool,
}

impl Actor {
    /// Build an actor at `position` from its configuration.
    ///
    /// The spawn point doubles as the patrol origin.
    #[must_use]
    pub fn new(id: EntityId, config: ActorConfig, position: Vec2Fixed) -> Self {
        let mut health = Health::new(config.max_health)
            .with_invincibility(config.invincibility_duration)
            .with_damage_multiplier(config.damage_multiplier);
        if let Some(armor) = config.armor {
            let pool = ArmorPool::new(armor.max, armor.regen_delay, armor.regen_rate);
            health = health.with_armor(pool);
        }
        let energy = config
            .energy
            .map(|energy| Energy::new(energy.max, energy.regen_rate, energy.regen_delay));

        Self {
            id,
            config,
            position,
            home: position,
            velocity: Vec2Fixed::ZERO,
            facing: Vec2Fixed::new(Fixed::ONE, Fixed::ZERO),
            health,
            energy,
            attack_cooldown: Timer::elapsed(),
            collision_enabled: true,
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Behavior configuration.
    #[must_use]
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Spawn point, used as the patrol origin.
    #[must_use]
    pub fn home(&self) -> Vec2Fixed {
        self.home
    }

    /// Whether `point` is within attack reach.
    #[must_use]
    pub fn in_attack_range(&self, point: Vec2Fixed) -> bool {
        self.position.within(point, self.config.attack_range)
    }

    /// Whether the cooldown has elapsed and any energy cost is affordable.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        if !self.attack_cooldown.is_elapsed() {
            return false;
        }
        match &self.energy {
            Some(energy) => energy.can_afford(self.config.attack_energy_cost),
            None => true,
        }
    }

    /// Turn toward `point`. Facing is left unchanged when standing on it.
    pub fn face(&mut self, point: Vec2Fixed) {
        let direction = (point - self.position).normalize();
        if !direction.is_zero() {
            self.facing = direction;
        }
    }

    /// Advance cooldown, invincibility, armor and energy timers.
    pub fn tick_vitals(&mut self, dt: Fixed) {
        self.attack_cooldown.tick(dt);
        self.health.tick(dt);
        if let Some(energy) = self.energy.as_mut() {
            energy.tick(dt);
        }
    }
}

impl Damageable for Actor {
    fn take_damage(&mut self, damage: DamageInstance) -> DamageOutcome {
        self.health.take_damage(damage)
    }

    fn current_health(&self) -> Fixed {
        self.health.current()
    }

    fn max_health(&self) -> Fixed {
        self.health.max()
    }

    fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }
}
