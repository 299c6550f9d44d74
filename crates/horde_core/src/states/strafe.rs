//! Strafe: orbit the target at a stand-off distance while waiting for a
//! token, retrying every tick.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::math::{Fixed, Vec2Fixed};
use crate::steering;
use crate::timer::Timer;

/// Strafers give each other more room than chasers.
const SEPARATION_SCALE: f64 = 1.5;

/// Strafe payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrafeState {
    direction: Fixed,
    timer: Timer,
}

impl Default for StrafeState {
    fn default() -> Self {
        Self {
            direction: Fixed::ONE,
            timer: Timer::elapsed(),
        }
    }
}

impl StrafeState {
    /// Orbit sign: `1` counter-clockwise, `-1` clockwise.
    #[must_use]
    pub fn direction(&self) -> Fixed {
        self.direction
    }
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Strafe(strafe) = state else {
        return;
    };
    let settings = ctx.actor.config().strafe;
    strafe.direction = ctx.rng.sign();
    strafe
        .timer
        .reset(ctx.rng.range(settings.min_duration, settings.max_duration));
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Strafe(strafe) = state else {
        return Transition::Stay;
    };
    let Some(target) = ctx.target_view() else {
        ctx.actor.velocity = Vec2Fixed::ZERO;
        return Transition::Change(AiState::resting(ctx.actor));
    };

    if ctx.actor.can_attack()
        && ctx.actor.in_attack_range(target.position)
        && ctx.arbiter.request_token()
    {
        return Transition::Change(AiState::attack());
    }

    let config = ctx.actor.config();
    let settings = config.strafe;
    let stand_off = config.stand_off_distance();
    let speed = config.move_speed * settings.speed_multiplier;
    let radius = config.separation_radius * Fixed::from_num(SEPARATION_SCALE);

    let position = ctx.actor.position;
    let tangent = steering::orbit(target.position, position, strafe.direction);
    let radial = steering::hold_distance(
        target.position,
        position,
        stand_off,
        settings.distance_band,
        settings.radial_weight,
    );
    let heading = (tangent + radial).normalize();
    let apart = ctx.arbiter.separation(radius);
    ctx.actor.velocity = steering::blend(&[heading, apart], speed);
    ctx.actor.face(target.position);

    strafe.timer.tick(ctx.dt);
    if strafe.timer.is_elapsed() {
        strafe.direction = -strafe.direction;
        strafe
            .timer
            .reset(ctx.rng.range(settings.min_duration, settings.max_duration));
    }
    Transition::Stay
}

pub(super) fn exit(_state: &mut AiState, _ctx: &mut StateContext<'_>, _reason: ExitReason) {}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ACTOR};
    use super::*;
    use crate::data::{ActorConfig, StrafeConfig};
    use crate::states::AiStateKind;

    fn direction_of(state: &AiState) -> Fixed {
        match state {
            AiState::Strafe(strafe) => strafe.direction(),
            _ => Fixed::ZERO,
        }
    }

    #[test]
    fn test_takes_free_token() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        let mut state = AiState::strafe();
        harness.enter(&mut state);

        match harness.execute(&mut state) {
            Transition::Change(next) => assert_eq!(next.kind(), AiStateKind::Attack),
            other => panic!("expected attack, got {other:?}"),
        }
        assert!(harness.arbiter.holds_token(ACTOR));
    }

    #[test]
    fn test_orbits_while_tokens_exhausted() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_f64(1.2, 0.0));
        harness.arbiter.register(50, Vec2Fixed::from_ints(40, 40));
        harness.arbiter.register(51, Vec2Fixed::from_ints(-40, 40));
        assert!(harness.arbiter.request_token(50));
        assert!(harness.arbiter.request_token(51));

        let mut state = AiState::strafe();
        harness.enter(&mut state);
        assert_eq!(harness.execute(&mut state), Transition::Stay);

        // At the stand-off distance the motion is purely tangential.
        let velocity = harness.actor.velocity;
        assert!(velocity.x.abs() < Fixed::from_num(0.01));
        assert!(velocity.y.abs() > Fixed::ZERO);
        assert!(velocity.length() <= Fixed::from_num(2.401));
        assert!(!harness.arbiter.holds_token(ACTOR));
    }

    #[test]
    fn test_direction_flips_on_timeout_only() {
        let config = ActorConfig {
            strafe: StrafeConfig {
                min_duration: Fixed::ONE,
                max_duration: Fixed::ONE,
                ..StrafeConfig::default()
            },
            ..ActorConfig::default()
        };
        let mut harness =
            Harness::new(config, Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(4, 0));
        harness.actor.attack_cooldown.reset(Fixed::from_num(100));

        let mut state = AiState::strafe();
        harness.enter(&mut state);
        let initial = direction_of(&state);

        for _ in 0..55 {
            harness.execute(&mut state);
            assert_eq!(direction_of(&state), initial);
        }
        for _ in 0..10 {
            harness.execute(&mut state);
        }
        assert_eq!(direction_of(&state), -initial);
    }

    #[test]
    fn test_backs_off_when_too_close() {
        let config = ActorConfig {
            ranged: true,
            attack_range: Fixed::from_num(7),
            preferred_distance: Fixed::from_num(4),
            ..ActorConfig::default()
        };
        let mut harness =
            Harness::new(config, Vec2Fixed::ZERO).with_target(Vec2Fixed::from_ints(1, 0));
        harness.actor.attack_cooldown.reset(Fixed::from_num(100));

        let mut state = AiState::strafe();
        harness.enter(&mut state);
        harness.execute(&mut state);
        assert!(harness.actor.velocity.x < Fixed::ZERO);
    }
}
