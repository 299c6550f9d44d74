//! Dead: terminal. Stop, drop collision, wait out the despawn delay.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::events::AiEvent;
use crate::math::Vec2Fixed;
use crate::timer::Timer;

/// Dead payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DeadState {
    despawn: Timer,
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Dead(dead) = state else {
        return;
    };
    ctx.actor.velocity = Vec2Fixed::ZERO;
    ctx.actor.collision_enabled = false;
    dead.despawn.reset(ctx.actor.config().despawn_delay);
    ctx.emit(AiEvent::Died {
        actor: ctx.actor_id(),
    });
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Dead(dead) = state else {
        return Transition::Stay;
    };
    ctx.actor.velocity = Vec2Fixed::ZERO;
    dead.despawn.tick(ctx.dt);
    if dead.despawn.is_elapsed() {
        Transition::Despawn
    } else {
        Transition::Stay
    }
}

pub(super) fn exit(_state: &mut AiState, _ctx: &mut StateContext<'_>, _reason: ExitReason) {}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::data::ActorConfig;

    #[test]
    fn test_disables_collision_and_despawns() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        harness.actor.velocity = Vec2Fixed::from_ints(2, 0);

        let mut state = AiState::dead();
        harness.enter(&mut state);
        assert!(!harness.actor.collision_enabled);
        assert_eq!(harness.actor.velocity, Vec2Fixed::ZERO);
        assert!(matches!(harness.events.last(), Some(AiEvent::Died { .. })));

        // Despawn delay is 1s.
        assert_eq!(harness.run_until_transition(&mut state, 59), Transition::Stay);
        assert_eq!(harness.run_until_transition(&mut state, 5), Transition::Despawn);
    }
}
