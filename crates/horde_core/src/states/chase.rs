//! Chase: freeze for the reaction delay, then run at the target while
//! keeping clear of other actors.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::math::{Fixed, Vec2Fixed};
use crate::steering;
use crate::timer::Timer;

/// Chase payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChaseState {
    reaction_delay: Fixed,
    reaction: Timer,
}

impl ChaseState {
    /// Chase that starts moving after `reaction_delay` seconds.
    #[must_use]
    pub fn new(reaction_delay: Fixed) -> Self {
        Self {
            reaction_delay,
            reaction: Timer::new(reaction_delay),
        }
    }

    /// Whether the surprise delay is still running.
    #[must_use]
    pub fn is_reacting(&self) -> bool {
        !self.reaction.is_elapsed()
    }
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Chase(chase) = state else {
        return;
    };
    chase.reaction.reset(chase.reaction_delay);
    ctx.actor.velocity = Vec2Fixed::ZERO;
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Chase(chase) = state else {
        return Transition::Stay;
    };
    let Some(target) = ctx.target_view() else {
        ctx.actor.velocity = Vec2Fixed::ZERO;
        return Transition::Change(AiState::resting(ctx.actor));
    };

    if chase.is_reacting() {
        chase.reaction.tick(ctx.dt);
        ctx.actor.velocity = Vec2Fixed::ZERO;
        ctx.actor.face(target.position);
        return Transition::Stay;
    }

    let config = ctx.actor.config();
    let (speed, radius) = (config.move_speed, config.separation_radius);
    let toward = (target.position - ctx.actor.position).normalize();
    let apart = ctx.arbiter.separation(radius);
    ctx.actor.velocity = steering::blend(&[toward, apart], speed);
    ctx.actor.face(target.position);
    Transition::Stay
}

pub(super) fn exit(_state: &mut AiState, ctx: &mut StateContext<'_>, reason: ExitReason) {
    if reason == ExitReason::Transition {
        ctx.actor.velocity = Vec2Fixed::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::data::ActorConfig;
    use crate::states::AiStateKind;

    #[test]
    fn test_stands_still_while_reacting() {
        let mut harness =
            Harness::new(ActorConfig::default(), Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(5, 0));
        let mut state = AiState::chase(Fixed::from_num(0.5));
        harness.enter(&mut state);

        for _ in 0..25 {
            harness.execute(&mut state);
            assert_eq!(harness.actor.velocity, Vec2Fixed::ZERO);
        }
        assert!(state.is_committed());

        for _ in 0..10 {
            harness.execute(&mut state);
        }
        assert!(!state.is_committed());
        assert!(harness.actor.velocity.x > Fixed::ZERO);
    }

    #[test]
    fn test_seeks_at_move_speed() {
        let mut harness =
            Harness::new(ActorConfig::default(), Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(0, 5));
        let mut state = AiState::chase(Fixed::ZERO);
        harness.enter(&mut state);
        harness.execute(&mut state);

        assert_eq!(harness.actor.velocity, Vec2Fixed::from_ints(0, 3));
        assert_eq!(harness.actor.facing, Vec2Fixed::from_ints(0, 1));
    }

    #[test]
    fn test_separation_bends_the_path() {
        let mut harness =
            Harness::new(ActorConfig::default(), Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(10, 0));
        harness.arbiter.register(2, Vec2Fixed::from_f64(0.0, 0.5));

        let mut state = AiState::chase(Fixed::ZERO);
        harness.enter(&mut state);
        harness.execute(&mut state);

        assert!(harness.actor.velocity.x > Fixed::ZERO);
        assert!(harness.actor.velocity.y < Fixed::ZERO);
        assert!(harness.actor.velocity.length() <= Fixed::from_num(3.001));
    }

    #[test]
    fn test_lost_target_returns_to_rest() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut state = AiState::chase(Fixed::ZERO);
        harness.enter(&mut state);
        match harness.execute(&mut state) {
            Transition::Change(next) => assert_eq!(next.kind(), AiStateKind::Patrol),
            other => panic!("expected a change, got {other:?}"),
        }
    }
}
