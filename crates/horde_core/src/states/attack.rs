//! Attack: windup, resolve the hit, recovery, then hand the token back.
//!
//! The windup always runs to completion. Damage is applied only if the
//! committed target is still alive and in reach at the instant the windup
//! elapses.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::combat::DamageInstance;
use crate::components::EntityId;
use crate::events::AiEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::timer::Timer;

/// Sub-phase of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttackPhase {
    /// Committed, hit not yet resolved.
    #[default]
    Windup,
    /// Hit resolved, holding before release.
    Recovery,
}

/// Attack payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttackState {
    phase: AttackPhase,
    timer: Timer,
    target: Option<EntityId>,
}

impl AttackState {
    /// Current sub-phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Seconds left in the current sub-phase.
    #[must_use]
    pub fn remaining(&self) -> Fixed {
        self.timer.remaining()
    }

    /// Target the attack was committed against.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Attack(attack) = state else {
        return;
    };
    attack.phase = AttackPhase::Windup;
    attack.timer.reset(ctx.actor.config().windup_time);
    attack.target = ctx.target;
    ctx.actor.velocity = Vec2Fixed::ZERO;

    if let Some(view) = ctx.target_view() {
        ctx.actor.face(view.position);
        ctx.emit(AiEvent::AttackCommitted {
            actor: ctx.actor_id(),
            target: view.id,
        });
    }
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Attack(attack) = state else {
        return Transition::Stay;
    };
    ctx.actor.velocity = Vec2Fixed::ZERO;
    attack.timer.tick(ctx.dt);

    match attack.phase {
        AttackPhase::Windup => {
            if let Some(view) = attack.target.and_then(|id| ctx.world.target(id)) {
                ctx.actor.face(view.position);
            }
            if attack.timer.is_elapsed() {
                resolve_hit(attack.target, ctx);
                attack.phase = AttackPhase::Recovery;
                attack.timer.reset(ctx.actor.config().recovery_time);
            }
            Transition::Stay
        }
        AttackPhase::Recovery => {
            if attack.timer.is_elapsed() {
                ctx.arbiter.release_token();
                Transition::Change(AiState::chase(Fixed::ZERO))
            } else {
                Transition::Stay
            }
        }
    }
}

pub(super) fn exit(_state: &mut AiState, ctx: &mut StateContext<'_>, _reason: ExitReason) {
    ctx.arbiter.release_token();
}

fn resolve_hit(target: Option<EntityId>, ctx: &mut StateContext<'_>) {
    let config = ctx.actor.config();
    let (damage, kind, knockback) = (config.attack_damage, config.damage_kind, config.knockback);
    let (cooldown, cost) = (config.attack_cooldown, config.attack_energy_cost);

    ctx.actor.attack_cooldown.reset(cooldown);
    if let Some(energy) = ctx.actor.energy.as_mut() {
        energy.consume(cost);
    }

    let actor = ctx.actor_id();
    let reachable = target
        .and_then(|id| ctx.world.target(id))
        .filter(|view| view.alive && ctx.actor.in_attack_range(view.position));

    let Some(view) = reachable else {
        ctx.emit(AiEvent::AttackMissed { actor, target });
        return;
    };

    let direction = (view.position - ctx.actor.position).normalize();
    let hit = DamageInstance::new(damage, kind)
        .from_source(actor)
        .with_knockback(direction * knockback)
        .with_hit_point(ctx.actor.position);

    match ctx.world.deliver_damage(view.id, hit) {
        Some(outcome) => ctx.emit(AiEvent::AttackLanded {
            actor,
            target: view.id,
            damage: hit,
            outcome,
        }),
        None => ctx.emit(AiEvent::AttackMissed { actor, target }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ACTOR, TARGET};
    use super::*;
    use crate::data::ActorConfig;
    use crate::states::AiStateKind;

    fn phase_of(state: &AiState) -> Option<AttackPhase> {
        match state {
            AiState::Attack(attack) => Some(attack.phase()),
            _ => None,
        }
    }

    #[test]
    fn test_full_attack_cycle() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        assert!(harness.arbiter.request_token(ACTOR));

        let mut state = AiState::attack();
        harness.enter(&mut state);
        assert_eq!(phase_of(&state), Some(AttackPhase::Windup));

        // Windup 0.5s
        for _ in 0..31 {
            harness.execute(&mut state);
        }
        assert_eq!(phase_of(&state), Some(AttackPhase::Recovery));
        let hits = harness.landed_hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].dealt(), Fixed::from_num(10));
        assert!(!harness.actor.can_attack());

        // Recovery 1.0s, then chase with no reaction delay.
        let next = harness.run_until_transition(&mut state, 120);
        match next {
            Transition::Change(next) => {
                assert_eq!(next.kind(), AiStateKind::Chase);
                assert!(!next.is_committed());
            }
            other => panic!("expected chase, got {other:?}"),
        }
        assert!(!harness.arbiter.holds_token(ACTOR));
    }

    #[test]
    fn test_target_leaving_range_during_windup_misses() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        let mut state = AiState::attack();
        harness.enter(&mut state);

        for _ in 0..20 {
            harness.execute(&mut state);
        }
        harness.move_target(Vec2Fixed::from_ints(6, 0));
        for _ in 0..20 {
            harness.execute(&mut state);
        }

        assert_eq!(phase_of(&state), Some(AttackPhase::Recovery));
        assert!(harness.landed_hits().is_empty());
        assert!(harness.events.iter().any(|e| matches!(
            e,
            AiEvent::AttackMissed { target: Some(TARGET), .. }
        )));
        // A miss still spends the cooldown.
        assert!(!harness.actor.can_attack());
    }

    #[test]
    fn test_knockback_points_away_from_attacker() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(0, 1));
        let mut state = AiState::attack();
        harness.enter(&mut state);
        for _ in 0..31 {
            harness.execute(&mut state);
        }
        let knockback = harness.world.get(TARGET).map(|t| t.last_knockback);
        assert_eq!(knockback, Some(Vec2Fixed::from_ints(0, 3)));
    }

    #[test]
    fn test_exit_releases_token_even_without_enter() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        assert!(harness.arbiter.request_token(ACTOR));
        let mut state = AiState::attack();
        harness.exit(&mut state, ExitReason::Death);
        assert!(!harness.arbiter.holds_token(ACTOR));
        // Second exit is a no-op.
        harness.exit(&mut state, ExitReason::Transition);
        assert_eq!(harness.arbiter.tokens_held(), 0);
    }
}
