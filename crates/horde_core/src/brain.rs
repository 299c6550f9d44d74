//! Decision layer: perception refresh plus a fixed priority policy.
//!
//! The brain runs once per actor per tick before the active state executes.
//! It never mutates the state itself; it proposes a replacement and the
//! [`crate::fsm::StateMachine`] applies it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::EntityId;
use crate::events::AiEvent;
use crate::math::Fixed;
use crate::states::{AiState, AiStateKind, StateContext};
use crate::world::TargetView;

/// Ranged actors closer than this fraction of their preferred distance back
/// off instead of chasing.
const BACK_OFF_FRACTION: f64 = 0.8;

/// Per-actor decision state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brain {
    target: Option<EntityId>,
}

impl Brain {
    /// A brain with no target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently perceived target.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Refresh perception, then pick the next state.
    ///
    /// Sets `ctx.target` so the state executed afterwards sees the same
    /// target.
    pub fn think(&mut self, current: &AiState, ctx: &mut StateContext<'_>) -> Option<AiState> {
        self.perceive(ctx);
        self.decide(current, ctx)
    }

    /// Drop a target that died or left `lose_range`, then acquire the
    /// nearest live target within `detection_range` if none is held.
    ///
    /// The gap between the two ranges keeps the target from flickering at
    /// the boundary.
    pub fn perceive(&mut self, ctx: &mut StateContext<'_>) -> Option<TargetView> {
        let actor_id = ctx.actor_id();
        let position = ctx.actor.position;
        let detection_range = ctx.actor.config().detection_range;
        let lose_range = ctx.actor.config().lose_range;

        let mut view = None;
        if let Some(id) = self.target {
            view = ctx
                .world
                .target(id)
                .filter(|view| view.alive && position.within(view.position, lose_range));
            if view.is_none() {
                self.target = None;
                debug!(actor = actor_id, target = id, "Target lost");
                ctx.emit(AiEvent::TargetLost {
                    actor: actor_id,
                    target: id,
                });
            }
        }

        if self.target.is_none() {
            view = ctx.world.nearest_target(position, detection_range);
            if let Some(found) = view {
                self.target = Some(found.id);
                debug!(actor = actor_id, target = found.id, "Target acquired");
                ctx.emit(AiEvent::TargetAcquired {
                    actor: actor_id,
                    target: found.id,
                });
            }
        }

        ctx.target = self.target;
        view
    }

    /// Priority policy. First match wins:
    ///
    /// 1. health below the flee threshold: Flee
    /// 2. no target: Patrol or Idle
    /// 3. in range and ready: Attack if a token is granted, else Strafe
    /// 4. ranged and well inside the preferred distance: Strafe
    /// 5. in range but not ready: Strafe
    /// 6. otherwise: Chase
    ///
    /// While strafing, the brain only leaves Strafe when the target is gone,
    /// beyond the strafe leash, or out of reach of a ranged actor that is not
    /// crowded; the state itself retries the token.
    /// Committed and dead states are left alone. A proposal of the current
    /// kind is dropped so timers are not reset.
    pub fn decide(&self, current: &AiState, ctx: &mut StateContext<'_>) -> Option<AiState> {
        if current.is_dead() || current.is_committed() {
            return None;
        }

        let target = ctx.target_view();
        let proposal = if ctx.actor.health.fraction() < ctx.actor.config().flee_health_threshold {
            AiState::flee(target.map(|view| view.position))
        } else if current.kind() == AiStateKind::Strafe {
            match target {
                None => AiState::resting(ctx.actor),
                Some(view) => {
                    let config = ctx.actor.config();
                    let leashed = ctx.actor.position.within(view.position, config.strafe_leash());
                    let out_of_reach = config.ranged
                        && !ctx.actor.in_attack_range(view.position)
                        && !Self::crowded(view, ctx);
                    if leashed && !out_of_reach {
                        return None;
                    }
                    AiState::chase(config.reaction_time)
                }
            }
        } else {
            match target {
                None => AiState::resting(ctx.actor),
                Some(view) => Self::engage(view, ctx),
            }
        };

        (proposal.kind() != current.kind()).then_some(proposal)
    }

    fn engage(view: TargetView, ctx: &mut StateContext<'_>) -> AiState {
        let config = ctx.actor.config();
        let in_range = ctx.actor.in_attack_range(view.position);

        if in_range && ctx.actor.can_attack() {
            return if ctx.arbiter.request_token() {
                AiState::attack()
            } else {
                AiState::strafe()
            };
        }

        if Self::crowded(view, ctx) || in_range {
            return AiState::strafe();
        }
        AiState::chase(config.reaction_time)
    }

    /// A ranged actor well inside its preferred distance.
    fn crowded(view: TargetView, ctx: &StateContext<'_>) -> bool {
        let config = ctx.actor.config();
        let back_off = config.preferred_distance * Fixed::from_num(BACK_OFF_FRACTION);
        config.ranged && ctx.actor.position.within(view.position, back_off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{DamageInstance, DamageKind, Damageable};
    use crate::data::{ActorConfig, ArbiterConfig};
    use crate::math::Vec2Fixed;
    use crate::states::test_support::{Harness, ACTOR, TARGET};

    fn decide(harness: &mut Harness, brain: &mut Brain, current: &AiState) -> Option<AiStateKind> {
        brain.think(current, &mut harness.ctx()).map(|state| state.kind())
    }

    #[test]
    fn test_acquire_and_lose_with_hysteresis() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_f64(8.5, 0.0));
        harness.target = None;
        let mut brain = Brain::new();

        brain.perceive(&mut harness.ctx());
        assert_eq!(brain.target(), None);

        harness.move_target(Vec2Fixed::from_f64(7.9, 0.0));
        brain.perceive(&mut harness.ctx());
        assert_eq!(brain.target(), Some(TARGET));

        // Oscillating just past detection range keeps the target.
        for tick in 0..20 {
            let x = if tick % 2 == 0 { 8.1 } else { 7.9 };
            harness.move_target(Vec2Fixed::from_f64(x, 0.0));
            brain.perceive(&mut harness.ctx());
            assert_eq!(brain.target(), Some(TARGET));
        }

        harness.move_target(Vec2Fixed::from_f64(12.5, 0.0));
        brain.perceive(&mut harness.ctx());
        assert_eq!(brain.target(), None);

        let acquired = harness
            .events
            .iter()
            .filter(|e| matches!(e, AiEvent::TargetAcquired { .. }))
            .count();
        assert_eq!(acquired, 1);
        assert!(matches!(
            harness.events.last(),
            Some(AiEvent::TargetLost { target: TARGET, .. })
        ));
    }

    #[test]
    fn test_dead_target_is_dropped() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(2, 0));
        let mut brain = Brain::new();
        brain.perceive(&mut harness.ctx());
        assert_eq!(brain.target(), Some(TARGET));

        if let Some(target) = harness.world.get_mut(TARGET) {
            target.take_damage(DamageInstance::new(Fixed::from_num(5000), DamageKind::Fire));
        }
        brain.perceive(&mut harness.ctx());
        assert_eq!(brain.target(), None);
    }

    #[test]
    fn test_no_target_rests() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::idle()),
            Some(AiStateKind::Patrol)
        );

        let patrol = AiState::resting(&harness.actor);
        assert_eq!(decide(&mut harness, &mut brain, &patrol), None);

        let config = ActorConfig {
            patrol: None,
            ..ActorConfig::default()
        };
        let mut harness = Harness::new(config, Vec2Fixed::ZERO);
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::strafe()),
            Some(AiStateKind::Idle)
        );
    }

    #[test]
    fn test_out_of_range_chases_with_reaction() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(5, 0));
        let mut brain = Brain::new();
        let next = brain.think(&AiState::idle(), &mut harness.ctx());
        assert!(next.as_ref().is_some_and(AiState::is_committed));
        assert_eq!(next.map(|s| s.kind()), Some(AiStateKind::Chase));
    }

    #[test]
    fn test_in_range_attacks_with_token() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::chase(Fixed::ZERO)),
            Some(AiStateKind::Attack)
        );
        assert!(harness.arbiter.holds_token(ACTOR));
    }

    #[test]
    fn test_denied_token_strafes() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        harness.arbiter = crate::arbiter::Arbiter::new(ArbiterConfig { capacity: 1 }).unwrap();
        harness.arbiter.register(ACTOR, Vec2Fixed::ZERO);
        harness.arbiter.register(2, Vec2Fixed::from_ints(9, 9));
        assert!(harness.arbiter.request_token(2));

        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::chase(Fixed::ZERO)),
            Some(AiStateKind::Strafe)
        );
        assert!(!harness.arbiter.holds_token(ACTOR));
    }

    #[test]
    fn test_cooldown_in_range_strafes() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        harness.actor.attack_cooldown.reset(Fixed::ONE);
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::chase(Fixed::ZERO)),
            Some(AiStateKind::Strafe)
        );
        assert_eq!(harness.arbiter.tokens_held(), 0);
    }

    #[test]
    fn test_flee_overrides_everything() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        harness.actor.health.set_health(Fixed::from_num(25));
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::chase(Fixed::ZERO)),
            Some(AiStateKind::Attack)
        );

        harness.arbiter.release_token(ACTOR);
        harness.actor.health.set_health(Fixed::from_num(15));
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::strafe()),
            Some(AiStateKind::Flee)
        );
        assert_eq!(decide(&mut harness, &mut brain, &AiState::flee(None)), None);
    }

    #[test]
    fn test_committed_states_are_left_alone() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        harness.actor.health.set_health(Fixed::from_num(5));
        let mut brain = Brain::new();
        assert_eq!(decide(&mut harness, &mut brain, &AiState::attack()), None);
        assert_eq!(decide(&mut harness, &mut brain, &AiState::chase(Fixed::ONE)), None);
        assert_eq!(decide(&mut harness, &mut brain, &AiState::dead()), None);
    }

    #[test]
    fn test_strafe_leash() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(2, 0));
        let mut brain = Brain::new();
        // Leash is max(1.2, 1.5) + 1.5 = 3.0.
        assert_eq!(decide(&mut harness, &mut brain, &AiState::strafe()), None);
        assert_eq!(harness.arbiter.tokens_held(), 0);

        harness.move_target(Vec2Fixed::from_f64(3.5, 0.0));
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::strafe()),
            Some(AiStateKind::Chase)
        );
    }

    #[test]
    fn test_ranged_strafer_out_of_reach_chases() {
        let config = ActorConfig {
            ranged: true,
            attack_range: Fixed::from_num(3),
            preferred_distance: Fixed::from_num(6),
            detection_range: Fixed::from_num(10),
            lose_range: Fixed::from_num(14),
            ..ActorConfig::default()
        };
        // Inside the leash (7.5) but beyond attack range and not crowded.
        let mut harness =
            Harness::new(config, Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(6, 0));
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::strafe()),
            Some(AiStateKind::Chase)
        );

        // Crowded inside the back-off distance keeps strafing.
        harness.move_target(Vec2Fixed::from_ints(4, 0));
        assert_eq!(decide(&mut harness, &mut brain, &AiState::strafe()), None);
    }

    #[test]
    fn test_ranged_backs_off_when_crowded() {
        let config = ActorConfig {
            ranged: true,
            attack_range: Fixed::from_num(2),
            preferred_distance: Fixed::from_num(5),
            detection_range: Fixed::from_num(10),
            lose_range: Fixed::from_num(14),
            ..ActorConfig::default()
        };
        let mut harness =
            Harness::new(config, Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(3, 0));
        let mut brain = Brain::new();
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::idle()),
            Some(AiStateKind::Strafe)
        );

        harness.move_target(Vec2Fixed::from_ints(6, 0));
        assert_eq!(
            decide(&mut harness, &mut brain, &AiState::idle()),
            Some(AiStateKind::Chase)
        );
    }
}
