//! Flee: run directly away from the threat at boosted speed for a while.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::math::Vec2Fixed;
use crate::steering;
use crate::timer::Timer;

/// Flee payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FleeState {
    threat: Option<Vec2Fixed>,
    timer: Timer,
}

impl FleeState {
    /// Flee from `threat`; with no threat the actor waits out the timer.
    #[must_use]
    pub fn new(threat: Option<Vec2Fixed>) -> Self {
        Self {
            threat,
            timer: Timer::elapsed(),
        }
    }

    /// Last known threat position.
    #[must_use]
    pub fn threat(&self) -> Option<Vec2Fixed> {
        self.threat
    }
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Flee(flee) = state else {
        return;
    };
    flee.timer.reset(ctx.actor.config().flee_duration);
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Flee(flee) = state else {
        return Transition::Stay;
    };
    flee.timer.tick(ctx.dt);
    if flee.timer.is_elapsed() {
        ctx.actor.velocity = Vec2Fixed::ZERO;
        return Transition::Change(AiState::resting(ctx.actor));
    }

    if let Some(view) = ctx.target_view() {
        flee.threat = Some(view.position);
    }
    let Some(threat) = flee.threat else {
        ctx.actor.velocity = Vec2Fixed::ZERO;
        return Transition::Stay;
    };

    let config = ctx.actor.config();
    let speed = config.move_speed * config.flee_speed_multiplier;
    let position = ctx.actor.position;
    ctx.actor.velocity = steering::flee(position, threat, speed);
    let ahead = position + ctx.actor.velocity;
    ctx.actor.face(ahead);
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
    use crate::math::Fixed;
    use crate::states::AiStateKind;

    #[test]
    fn test_runs_away_at_boosted_speed() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(2, 0));
        let mut state = AiState::flee(None);
        harness.enter(&mut state);
        harness.execute(&mut state);

        // 3.0 * 1.5
        assert_eq!(harness.actor.velocity, Vec2Fixed::from_f64(-4.5, 0.0));
        assert_eq!(harness.actor.facing, Vec2Fixed::from_ints(-1, 0));
    }

    #[test]
    fn test_remembers_threat_after_losing_sight() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(0, 2));
        let mut state = AiState::flee(None);
        harness.enter(&mut state);
        harness.execute(&mut state);

        harness.target = None;
        harness.execute(&mut state);
        assert!(harness.actor.velocity.y < Fixed::ZERO);
    }

    #[test]
    fn test_ends_after_duration() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut state = AiState::flee(Some(Vec2Fixed::from_ints(1, 0)));
        harness.enter(&mut state);

        // 3s at 60 ticks per second
        let mut ticks = 0;
        let next = loop {
            ticks += 1;
            match harness.execute(&mut state) {
                Transition::Stay => assert!(ticks < 200),
                other => break other,
            }
        };
        assert!((180..=182).contains(&ticks));
        match next {
            Transition::Change(next) => assert_eq!(next.kind(), AiStateKind::Patrol),
            other => panic!("expected patrol, got {other:?}"),
        }
        assert_eq!(harness.actor.velocity, Vec2Fixed::ZERO);
    }
}
