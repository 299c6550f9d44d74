//! Vital records attached to actors and targets.
//!
//! Health, armor and energy are plain data with their own timers. They are
//! advanced once per tick by the owner and mutated only through the methods
//! below.

use serde::{Deserialize, Serialize};

use crate::combat::{DamageInstance, DamageOutcome, Damageable, IgnoreReason};
use crate::math::{fixed_serde, Fixed};
use crate::timer::Timer;

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Armor
// ============================================================================

/// Armor pool that soaks damage before health.
///
/// Regenerates at `regen_rate` points per second once `regen_delay` seconds
/// have passed without absorbing a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArmorPool {
    #[serde(with = "fixed_serde")]
    current: Fixed,
    #[serde(with = "fixed_serde")]
    max: Fixed,
    #[serde(with = "fixed_serde")]
    regen_delay: Fixed,
    #[serde(with = "fixed_serde")]
    regen_rate: Fixed,
    regen_timer: Timer,
}

impl ArmorPool {
    /// Create a full armor pool.
    #[must_use]
    pub fn new(max: Fixed, regen_delay: Fixed, regen_rate: Fixed) -> Self {
        Self {
            current: max,
            max,
            regen_delay,
            regen_rate,
            regen_timer: Timer::elapsed(),
        }
    }

    /// Current armor points.
    #[must_use]
    pub fn current(&self) -> Fixed {
        self.current
    }

    /// Maximum armor points.
    #[must_use]
    pub fn max(&self) -> Fixed {
        self.max
    }

    /// Soak up to `amount`, returning how much was absorbed.
    pub fn absorb(&mut self, amount: Fixed) -> Fixed {
        let absorbed = amount.min(self.current).max(Fixed::ZERO);
        if absorbed > Fixed::ZERO {
            self.current -= absorbed;
            self.regen_timer.reset(self.regen_delay);
        }
        absorbed
    }

    /// Advance regeneration.
    pub fn tick(&mut self, dt: Fixed) {
        if !self.regen_timer.is_elapsed() {
            self.regen_timer.tick(dt);
            return;
        }
        if self.current < self.max {
            self.current = (self.current + self.regen_rate * dt).min(self.max);
        }
    }

    /// Refill completely.
    pub fn reset(&mut self) {
        self.current = self.max;
        self.regen_timer = Timer::elapsed();
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health record with invincibility window, damage multiplier and optional
/// armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    #[serde(with = "fixed_serde")]
    current: Fixed,
    #[serde(with = "fixed_serde")]
    max: Fixed,
    invincibility: Timer,
    #[serde(with = "fixed_serde")]
    invincibility_duration: Fixed,
    #[serde(with = "fixed_serde")]
    damage_multiplier: Fixed,
    armor: Option<ArmorPool>,
    dead: bool,
}

impl Health {
    /// Create a health record at full health with no invincibility window.
    #[must_use]
    pub fn new(max: Fixed) -> Self {
        Self {
            current: max,
            max,
            invincibility: Timer::elapsed(),
            invincibility_duration: Fixed::ZERO,
            damage_multiplier: Fixed::ONE,
            armor: None,
            dead: max <= Fixed::ZERO,
        }
    }

    /// Set the invincibility window opened by each landed hit.
    #[must_use]
    pub fn with_invincibility(mut self, duration: Fixed) -> Self {
        self.invincibility_duration = duration;
        self
    }

    /// Scale all incoming damage.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: Fixed) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Attach an armor pool.
    #[must_use]
    pub fn with_armor(mut self, armor: ArmorPool) -> Self {
        self.armor = Some(armor);
        self
    }

    /// Current health points.
    #[must_use]
    pub fn current(&self) -> Fixed {
        self.current
    }

    /// Maximum health points.
    #[must_use]
    pub fn max(&self) -> Fixed {
        self.max
    }

    /// Current health as a fraction of max.
    #[must_use]
    pub fn fraction(&self) -> Fixed {
        if self.max <= Fixed::ZERO {
            Fixed::ZERO
        } else {
            self.current / self.max
        }
    }

    /// Whether the death flag is set.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether hits are currently ignored.
    #[must_use]
    pub fn is_invincible(&self) -> bool {
        !self.invincibility.is_elapsed()
    }

    /// Armor pool, if any.
    #[must_use]
    pub fn armor(&self) -> Option<&ArmorPool> {
        self.armor.as_ref()
    }

    /// Advance the invincibility window and armor regeneration.
    pub fn tick(&mut self, dt: Fixed) {
        self.invincibility.tick(dt);
        if let Some(armor) = self.armor.as_mut() {
            armor.tick(dt);
        }
    }

    /// Restore up to `amount` health, returning how much was restored.
    ///
    /// The dead cannot be healed.
    pub fn heal(&mut self, amount: Fixed) -> Fixed {
        if self.dead || amount <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Overwrite health, clamped to `[0, max]`. Zero kills.
    pub fn set_health(&mut self, value: Fixed) {
        self.current = value.max(Fixed::ZERO).min(self.max);
        self.dead = self.current == Fixed::ZERO;
    }

    /// Back to full health and full armor, clearing death and invincibility.
    pub fn reset(&mut self) {
        self.current = self.max;
        self.dead = self.max <= Fixed::ZERO;
        self.invincibility = Timer::elapsed();
        if let Some(armor) = self.armor.as_mut() {
            armor.reset();
        }
    }
}

impl Damageable for Health {
    fn take_damage(&mut self, damage: DamageInstance) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored(IgnoreReason::Dead);
        }
        if self.is_invincible() {
            return DamageOutcome::Ignored(IgnoreReason::Invincible);
        }

        let scaled = (damage.amount() * self.damage_multiplier).max(Fixed::ZERO);
        let absorbed = self
            .armor
            .as_mut()
            .map_or(Fixed::ZERO, |armor| armor.absorb(scaled));
        let dealt = (scaled - absorbed).min(self.current);

        self.current -= dealt;
        self.invincibility.reset(self.invincibility_duration);

        let killed = self.current <= Fixed::ZERO;
        if killed {
            self.current = Fixed::ZERO;
            self.dead = true;
        }

        DamageOutcome::Applied {
            absorbed,
            dealt,
            killed,
        }
    }

    fn current_health(&self) -> Fixed {
        self.current
    }

    fn max_health(&self) -> Fixed {
        self.max
    }

    fn is_alive(&self) -> bool {
        !self.dead
    }
}

// ============================================================================
// Energy
// ============================================================================

/// Energy record spent on abilities.
///
/// Regenerates at `regen_rate` per second once `regen_delay` seconds have
/// passed since the last spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Energy {
    #[serde(with = "fixed_serde")]
    current: Fixed,
    #[serde(with = "fixed_serde")]
    max: Fixed,
    #[serde(with = "fixed_serde")]
    regen_rate: Fixed,
    #[serde(with = "fixed_serde")]
    regen_delay: Fixed,
    regen_timer: Timer,
}

impl Energy {
    /// Create a full energy record.
    #[must_use]
    pub fn new(max: Fixed, regen_rate: Fixed, regen_delay: Fixed) -> Self {
        Self {
            current: max,
            max,
            regen_rate,
            regen_delay,
            regen_timer: Timer::elapsed(),
        }
    }

    /// Current energy.
    #[must_use]
    pub fn current(&self) -> Fixed {
        self.current
    }

    /// Maximum energy.
    #[must_use]
    pub fn max(&self) -> Fixed {
        self.max
    }

    /// Whether `amount` could be spent right now.
    #[must_use]
    pub fn can_afford(&self, amount: Fixed) -> bool {
        self.current >= amount
    }

    /// Spend `amount` if affordable. Leaves the record untouched otherwise.
    pub fn try_consume(&mut self, amount: Fixed) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.current -= amount;
        self.regen_timer.reset(self.regen_delay);
        true
    }

    /// Spend `amount` regardless, clamping at zero.
    pub fn consume(&mut self, amount: Fixed) {
        self.current = (self.current - amount).max(Fixed::ZERO);
        self.regen_timer.reset(self.regen_delay);
    }

    /// Add energy, clamped to max.
    pub fn add(&mut self, amount: Fixed) {
        self.current = (self.current + amount).min(self.max).max(Fixed::ZERO);
    }

    /// Refill and cancel any pending regen delay.
    pub fn reset(&mut self) {
        self.current = self.max;
        self.regen_timer = Timer::elapsed();
    }

    /// Change the maximum, clamping current energy to it.
    pub fn set_max(&mut self, max: Fixed) {
        self.max = max.max(Fixed::ZERO);
        self.current = self.current.min(self.max);
    }

    /// Advance regeneration.
    pub fn tick(&mut self, dt: Fixed) {
        if !self.regen_timer.is_elapsed() {
            self.regen_timer.tick(dt);
            return;
        }
        if self.current < self.max {
            self.current = (self.current + self.regen_rate * dt).min(self.max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamageKind;

    fn f(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn hit(amount: f64) -> DamageInstance {
        DamageInstance::new(f(amount), DamageKind::Physical)
    }

    #[test]
    fn test_health_damage_and_death() {
        let mut health = Health::new(f(30.0));
        let outcome = health.take_damage(hit(10.0));
        assert_eq!(outcome.dealt(), f(10.0));
        assert!(!outcome.killed());
        assert_eq!(health.current(), f(20.0));

        let outcome = health.take_damage(hit(50.0));
        assert!(outcome.killed());
        assert_eq!(outcome.dealt(), f(20.0));
        assert_eq!(health.current(), Fixed::ZERO);
        assert!(health.is_dead());
        assert!(!health.is_alive());
    }

    #[test]
    fn test_dead_ignore_damage_and_heal() {
        let mut health = Health::new(f(10.0));
        health.take_damage(hit(10.0));
        assert_eq!(
            health.take_damage(hit(1.0)),
            DamageOutcome::Ignored(IgnoreReason::Dead)
        );
        assert_eq!(health.heal(f(5.0)), Fixed::ZERO);
        assert_eq!(health.current(), Fixed::ZERO);
    }

    #[test]
    fn test_invincibility_window() {
        let mut health = Health::new(f(100.0)).with_invincibility(f(0.5));
        assert!(health.take_damage(hit(10.0)).landed());
        assert_eq!(
            health.take_damage(hit(10.0)),
            DamageOutcome::Ignored(IgnoreReason::Invincible)
        );

        health.tick(f(0.5));
        assert!(health.take_damage(hit(10.0)).landed());
        assert_eq!(health.current(), f(80.0));
    }

    #[test]
    fn test_damage_multiplier() {
        let mut health = Health::new(f(100.0)).with_damage_multiplier(f(1.5));
        assert_eq!(health.take_damage(hit(10.0)).dealt(), f(15.0));
    }

    #[test]
    fn test_armor_absorbs_first_then_regenerates() {
        let armor = ArmorPool::new(f(5.0), f(3.0), f(0.5));
        let mut health = Health::new(f(20.0)).with_armor(armor);

        let outcome = health.take_damage(hit(8.0));
        assert_eq!(
            outcome,
            DamageOutcome::Applied {
                absorbed: f(5.0),
                dealt: f(3.0),
                killed: false,
            }
        );
        assert_eq!(health.armor().map(ArmorPool::current), Some(Fixed::ZERO));

        // Delay must pass before regeneration starts.
        health.tick(f(2.0));
        assert_eq!(health.armor().map(ArmorPool::current), Some(Fixed::ZERO));
        health.tick(f(1.0));
        health.tick(f(2.0));
        assert_eq!(health.armor().map(ArmorPool::current), Some(f(1.0)));
    }

    #[test]
    fn test_heal_clamps_and_reports() {
        let mut health = Health::new(f(10.0));
        health.take_damage(hit(4.0));
        assert_eq!(health.heal(f(10.0)), f(4.0));
        assert_eq!(health.current(), f(10.0));
        assert_eq!(health.heal(f(1.0)), Fixed::ZERO);
    }

    #[test]
    fn test_set_health_and_reset() {
        let mut health = Health::new(f(10.0));
        health.set_health(f(25.0));
        assert_eq!(health.current(), f(10.0));

        health.set_health(f(2.5));
        assert_eq!(health.fraction(), f(0.25));

        health.set_health(Fixed::ZERO);
        assert!(health.is_dead());

        health.reset();
        assert!(!health.is_dead());
        assert_eq!(health.current(), f(10.0));
    }

    #[test]
    fn test_energy_try_consume_is_all_or_nothing() {
        let mut energy = Energy::new(f(10.0), f(5.0), f(1.0));
        assert!(energy.try_consume(f(6.0)));
        assert!(!energy.try_consume(f(6.0)));
        assert_eq!(energy.current(), f(4.0));
    }

    #[test]
    fn test_energy_consume_clamps_and_regen_waits() {
        let mut energy = Energy::new(f(10.0), f(5.0), f(1.0));
        energy.consume(f(20.0));
        assert_eq!(energy.current(), Fixed::ZERO);

        energy.tick(f(1.0));
        assert_eq!(energy.current(), Fixed::ZERO);
        energy.tick(f(1.0));
        assert_eq!(energy.current(), f(5.0));
        energy.tick(f(10.0));
        assert_eq!(energy.current(), f(10.0));
    }

    #[test]
    fn test_energy_add_set_max_reset() {
        let mut energy = Energy::new(f(10.0), f(1.0), f(0.0));
        energy.consume(f(8.0));
        energy.add(f(3.0));
        assert_eq!(energy.current(), f(5.0));

        energy.set_max(f(4.0));
        assert_eq!(energy.current(), f(4.0));
        assert!(energy.can_afford(f(4.0)));

        energy.set_max(f(12.0));
        energy.reset();
        assert_eq!(energy.current(), f(12.0));
    }
}
