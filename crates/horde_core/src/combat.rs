//! Damage contract shared by actors and the targets they attack.
//!
//! A [`DamageInstance`] is built once by the attacker and handed by value to
//! anything implementing [`Damageable`]. The receiver reports what actually
//! happened through a [`DamageOutcome`].

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Damage classification carried by every hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DamageKind {
    /// Blunt and bladed hits.
    #[default]
    Physical,
    /// Burning damage.
    Fire,
    /// Freezing damage.
    Ice,
    /// Toxic damage.
    Poison,
    /// Mind damage.
    Psychic,
}

/// A single hit. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageInstance {
    #[serde(with = "fixed_serde")]
    amount: Fixed,
    kind: DamageKind,
    source: Option<EntityId>,
    knockback: Vec2Fixed,
    hit_point: Vec2Fixed,
}

impl DamageInstance {
    /// Create a hit of `amount` damage with no source, knockback or hit point.
    #[must_use]
    pub fn new(amount: Fixed, kind: DamageKind) -> Self {
        Self {
            amount,
            kind,
            source: None,
            knockback: Vec2Fixed::ZERO,
            hit_point: Vec2Fixed::ZERO,
        }
    }

    /// Attribute the hit to an attacking entity.
    #[must_use]
    pub fn from_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach a knockback impulse.
    #[must_use]
    pub fn with_knockback(mut self, knockback: Vec2Fixed) -> Self {
        self.knockback = knockback;
        self
    }

    /// Attach the world position the hit originated from.
    #[must_use]
    pub fn with_hit_point(mut self, hit_point: Vec2Fixed) -> Self {
        self.hit_point = hit_point;
        self
    }

    /// Raw damage before multipliers and armor.
    #[must_use]
    pub fn amount(&self) -> Fixed {
        self.amount
    }

    /// Damage classification.
    #[must_use]
    pub fn kind(&self) -> DamageKind {
        self.kind
    }

    /// Attacking entity, if any.
    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Knockback impulse for the external physics layer.
    #[must_use]
    pub fn knockback(&self) -> Vec2Fixed {
        self.knockback
    }

    /// Position the hit came from.
    #[must_use]
    pub fn hit_point(&self) -> Vec2Fixed {
        self.hit_point
    }
}

/// Why a hit had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// The receiver was already dead.
    Dead,
    /// The receiver's invincibility window was still running.
    Invincible,
}

/// Result of delivering a [`DamageInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// The hit was discarded.
    Ignored(IgnoreReason),
    /// The hit landed.
    Applied {
        /// Damage soaked by armor.
        #[serde(with = "fixed_serde")]
        absorbed: Fixed,
        /// Damage removed from health.
        #[serde(with = "fixed_serde")]
        dealt: Fixed,
        /// Whether this hit brought health to zero.
        killed: bool,
    },
}

impl DamageOutcome {
    /// Whether the hit was applied at all.
    #[must_use]
    pub fn landed(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Whether the hit killed the receiver.
    #[must_use]
    pub fn killed(&self) -> bool {
        matches!(self, Self::Applied { killed: true, .. })
    }

    /// Health removed by the hit (zero when ignored).
    #[must_use]
    pub fn dealt(&self) -> Fixed {
        match self {
            Self::Applied { dealt, .. } => *dealt,
            Self::Ignored(_) => Fixed::ZERO,
        }
    }
}

/// Anything that can receive hits.
pub trait Damageable {
    /// Apply a hit.
    fn take_damage(&mut self, damage: DamageInstance) -> DamageOutcome;

    /// Current health points.
    fn current_health(&self) -> Fixed;

    /// Maximum health points.
    fn max_health(&self) -> Fixed;

    /// Whether the receiver is still alive.
    fn is_alive(&self) -> bool {
        self.current_health() > Fixed::ZERO
    }
}
