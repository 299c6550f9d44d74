//! Fire-and-forget notifications for presentation and analytics layers.
//!
//! The core never waits on a consumer; events are collected per tick and
//! handed back in [`crate::simulation::TickEvents`].

use serde::{Deserialize, Serialize};

use crate::combat::{DamageInstance, DamageOutcome};
use crate::components::EntityId;
use crate::math::Vec2Fixed;
use crate::states::AiStateKind;

/// Something observable happened to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiEvent {
    /// The active state changed.
    StateChanged {
        /// Actor.
        actor: EntityId,
        /// Previous state.
        from: AiStateKind,
        /// New state.
        to: AiStateKind,
    },
    /// A target entered perception.
    TargetAcquired {
        /// Actor.
        actor: EntityId,
        /// Acquired target.
        target: EntityId,
    },
    /// The held target was dropped (dead, gone, or beyond lose range).
    TargetLost {
        /// Actor.
        actor: EntityId,
        /// Dropped target.
        target: EntityId,
    },
    /// An attack windup started.
    AttackCommitted {
        /// Actor.
        actor: EntityId,
        /// Intended target.
        target: EntityId,
    },
    /// A windup resolved with the target in range.
    AttackLanded {
        /// Actor.
        actor: EntityId,
        /// Hit target.
        target: EntityId,
        /// The hit that was delivered.
        damage: DamageInstance,
        /// What the target reported.
        outcome: DamageOutcome,
    },
    /// A windup resolved with no target in range.
    AttackMissed {
        /// Actor.
        actor: EntityId,
        /// Target at the time of the miss, if still known.
        target: Option<EntityId>,
    },
    /// A patrol destination was picked.
    PatrolDestination {
        /// Actor.
        actor: EntityId,
        /// Chosen point.
        destination: Vec2Fixed,
    },
    /// The actor received a hit (`OnDamaged`).
    Damaged {
        /// Actor.
        actor: EntityId,
        /// Incoming hit.
        damage: DamageInstance,
        /// What the actor's health reported.
        outcome: DamageOutcome,
    },
    /// The actor died.
    Died {
        /// Actor.
        actor: EntityId,
    },
    /// The actor was removed after its despawn delay.
    Despawned {
        /// Actor.
        actor: EntityId,
    },
}

impl AiEvent {
    /// Actor the event belongs to.
    #[must_use]
    pub fn actor(&self) -> EntityId {
        match *self {
            Self::StateChanged { actor, .. }
            | Self::TargetAcquired { actor, .. }
            | Self::TargetLost { actor, .. }
            | Self::AttackCommitted { actor, .. }
            | Self::AttackLanded { actor, .. }
            | Self::AttackMissed { actor, .. }
            | Self::PatrolDestination { actor, .. }
            | Self::Damaged { actor, .. }
            | Self::Died { actor }
            | Self::Despawned { actor } => actor,
        }
    }
}
