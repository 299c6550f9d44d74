//! Perception and damage delivery against player-side targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::{DamageInstance, DamageOutcome, Damageable};
use crate::components::{ArmorPool, EntityId, Health};
use crate::data::TargetConfig;
use crate::math::{Fixed, Vec2Fixed};

/// Read-only snapshot of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetView {
    /// Target id.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Whether the target is alive.
    pub alive: bool,
}

/// World collaborator consulted by brains and states.
pub trait WorldQuery {
    /// Look up a target by id.
    fn target(&self, id: EntityId) -> Option<TargetView>;

    /// Nearest live target within `radius` of `from` (inclusive).
    ///
    /// Ties resolve to the lowest id.
    fn nearest_target(&self, from: Vec2Fixed, radius: Fixed) -> Option<TargetView>;

    /// Deliver a hit to a target. `None` when no such target exists.
    fn deliver_damage(&mut self, id: EntityId, damage: DamageInstance) -> Option<DamageOutcome>;
}

/// A player-side entity actors hunt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Health record.
    pub health: Health,
    /// Knockback from the most recent landed hit, for the physics layer.
    pub last_knockback: Vec2Fixed,
}

impl Target {
    /// Create a target from its configuration.
    #[must_use]
    pub fn new(id: EntityId, config: &TargetConfig, position: Vec2Fixed) -> Self {
        let mut health =
            Health::new(config.max_health).with_invincibility(config.invincibility_duration);
        if let Some(armor) = config.armor {
            let pool = ArmorPool::new(armor.max, armor.regen_delay, armor.regen_rate);
            health = health.with_armor(pool);
        }
        Self {
            id,
            position,
            health,
            last_knockback: Vec2Fixed::ZERO,
        }
    }

    /// Target id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Snapshot for perception.
    #[must_use]
    pub fn view(&self) -> TargetView {
        TargetView {
            id: self.id,
            position: self.position,
            alive: self.is_alive(),
        }
    }
}

impl Damageable for Target {
    fn take_damage(&mut self, damage: DamageInstance) -> DamageOutcome {
        let outcome = self.health.take_damage(damage);
        if outcome.landed() {
            self.last_knockback = damage.knockback();
        }
        outcome
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

/// Targets stored in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistry {
    targets: BTreeMap<EntityId, Target>,
}

impl TargetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a target.
    pub fn insert(&mut self, target: Target) {
        self.targets.insert(target.id(), target);
    }

    /// Remove a target.
    pub fn remove(&mut self, id: EntityId) -> Option<Target> {
        self.targets.remove(&id)
    }

    /// Get a target.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Target> {
        self.targets.get(&id)
    }

    /// Get a target mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Target> {
        self.targets.get_mut(&id)
    }

    /// Iterate targets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Advance every target's health timers.
    pub fn tick(&mut self, dt: Fixed) {
        for target in self.targets.values_mut() {
            target.health.tick(dt);
        }
    }
}

impl WorldQuery for TargetRegistry {
    fn target(&self, id: EntityId) -> Option<TargetView> {
        self.targets.get(&id).map(Target::view)
    }

    fn nearest_target(&self, from: Vec2Fixed, radius: Fixed) -> Option<TargetView> {
        let mut best: Option<(Fixed, TargetView)> = None;

        // Id order plus strict comparison keeps the lowest id on ties.
        for target in self.targets.values() {
            if !target.is_alive() {
                continue;
            }
            if !from.within(target.position, radius) {
                continue;
            }
            let dist_sq = from.distance_squared(target.position);
            match best {
                Some((best_sq, _)) if best_sq <= dist_sq => {}
                _ => best = Some((dist_sq, target.view())),
            }
        }

        best.map(|(_, view)| view)
    }

    fn deliver_damage(&mut self, id: EntityId, damage: DamageInstance) -> Option<DamageOutcome> {
        self.targets.get_mut(&id).map(|target| target.take_damage(damage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamageKind;

    fn unarmored() -> TargetConfig {
        TargetConfig {
            max_health: Fixed::from_num(20),
            armor: None,
            invincibility_duration: Fixed::ZERO,
        }
    }

    fn registry(points: &[(EntityId, i32, i32)]) -> TargetRegistry {
        let mut registry = TargetRegistry::new();
        for &(id, x, y) in points {
            registry.insert(Target::new(id, &unarmored(), Vec2Fixed::from_ints(x, y)));
        }
        registry
    }

    #[test]
    fn test_nearest_within_radius() {
        let registry = registry(&[(1, 10, 0), (2, 3, 0), (3, 0, 4)]);
        let nearest = registry.nearest_target(Vec2Fixed::ZERO, Fixed::from_num(5));
        assert_eq!(nearest.map(|v| v.id), Some(2));

        assert!(registry
            .nearest_target(Vec2Fixed::ZERO, Fixed::from_num(2))
            .is_none());
    }

    #[test]
    fn test_nearest_tie_breaks_by_lowest_id() {
        let registry = registry(&[(9, 3, 0), (4, -3, 0), (6, 0, 3)]);
        let nearest = registry.nearest_target(Vec2Fixed::ZERO, Fixed::from_num(5));
        assert_eq!(nearest.map(|v| v.id), Some(4));
    }

    #[test]
    fn test_dead_targets_are_invisible() {
        let mut registry = registry(&[(1, 1, 0), (2, 2, 0)]);
        let hit = DamageInstance::new(Fixed::from_num(50), DamageKind::Physical);
        let outcome = registry.deliver_damage(1, hit);
        assert_eq!(outcome.map(|o| o.killed()), Some(true));

        let nearest = registry.nearest_target(Vec2Fixed::ZERO, Fixed::from_num(5));
        assert_eq!(nearest.map(|v| v.id), Some(2));
        assert_eq!(registry.target(1).map(|v| v.alive), Some(false));
    }

    #[test]
    fn test_deliver_damage_missing_target() {
        let mut registry = TargetRegistry::new();
        let hit = DamageInstance::new(Fixed::ONE, DamageKind::Physical);
        assert!(registry.deliver_damage(42, hit).is_none());
    }

    #[test]
    fn test_knockback_recorded() {
        let mut registry = registry(&[(1, 0, 0)]);
        let hit = DamageInstance::new(Fixed::ONE, DamageKind::Physical)
            .with_knockback(Vec2Fixed::from_ints(3, 0));
        registry.deliver_damage(1, hit);
        assert_eq!(
            registry.get(1).map(|t| t.last_knockback),
            Some(Vec2Fixed::from_ints(3, 0))
        );
    }
}
