//! Patrol: wait, pick a random point around the origin, walk there, repeat.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::events::AiEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::steering;
use crate::timer::Timer;

/// Wait jitter applied after each arrival, in seconds either way.
const WAIT_JITTER: f64 = 0.5;
/// Closest fraction of the radius a destination may be picked at.
const MIN_RADIUS_FRACTION: f64 = 0.3;
/// Used when the actor has no patrol config of its own.
const DEFAULT_ARRIVAL: f64 = 0.3;

/// Patrol payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatrolState {
    origin: Vec2Fixed,
    radius: Fixed,
    wait_time: Fixed,
    destination: Option<Vec2Fixed>,
    wait: Timer,
}

impl PatrolState {
    /// Patrol within `radius` of `origin`, pausing about `wait_time` between legs.
    #[must_use]
    pub fn new(origin: Vec2Fixed, radius: Fixed, wait_time: Fixed) -> Self {
        Self {
            origin,
            radius,
            wait_time,
            destination: None,
            wait: Timer::new(wait_time / Fixed::from_num(2)),
        }
    }

    /// Center of the patrol area.
    #[must_use]
    pub fn origin(&self) -> Vec2Fixed {
        self.origin
    }

    /// Current leg's destination, if walking.
    #[must_use]
    pub fn destination(&self) -> Option<Vec2Fixed> {
        self.destination
    }
}

pub(super) fn enter(state: &mut AiState, ctx: &mut StateContext<'_>) {
    let AiState::Patrol(patrol) = state else {
        return;
    };
    ctx.actor.velocity = Vec2Fixed::ZERO;
    patrol.destination = None;
    patrol.wait.reset(patrol.wait_time / Fixed::from_num(2));
}

pub(super) fn execute(state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    let AiState::Patrol(patrol) = state else {
        return Transition::Stay;
    };

    let Some(destination) = patrol.destination else {
        ctx.actor.velocity = Vec2Fixed::ZERO;
        patrol.wait.tick(ctx.dt);
        if patrol.wait.is_elapsed() {
            let direction = ctx.rng.unit_direction();
            let distance = ctx
                .rng
                .range(patrol.radius * Fixed::from_num(MIN_RADIUS_FRACTION), patrol.radius);
            let destination = patrol.origin + direction * distance;
            patrol.destination = Some(destination);
            ctx.emit(AiEvent::PatrolDestination {
                actor: ctx.actor_id(),
                destination,
            });
        }
        return Transition::Stay;
    };

    let arrival = ctx
        .actor
        .config()
        .patrol
        .map_or(Fixed::from_num(DEFAULT_ARRIVAL), |p| p.arrival_tolerance);

    if ctx.actor.position.distance_squared(destination) < arrival * arrival {
        let jitter = Fixed::from_num(WAIT_JITTER);
        let wait = patrol.wait_time + ctx.rng.range(-jitter, jitter);
        patrol.destination = None;
        patrol.wait.reset(wait.max(Fixed::ZERO));
        ctx.actor.velocity = Vec2Fixed::ZERO;
    } else {
        let speed = ctx.actor.config().move_speed;
        ctx.actor.velocity = steering::seek(ctx.actor.position, destination, speed);
        ctx.actor.face(destination);
    }
    Transition::Stay
}

pub(super) fn exit(_state: &mut AiState, _ctx: &mut StateContext<'_>, _reason: ExitReason) {}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::data::ActorConfig;

    fn destination_of(state: &AiState) -> Option<Vec2Fixed> {
        match state {
            AiState::Patrol(patrol) => patrol.destination(),
            _ => None,
        }
    }

    fn patrolling(harness: &Harness) -> AiState {
        AiState::resting(&harness.actor)
    }

    #[test]
    fn test_first_leg_after_half_wait() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut state = patrolling(&harness);
        harness.enter(&mut state);

        // Default wait is 2s, so the first pick happens after ~1s (60 ticks).
        for _ in 0..55 {
            harness.execute(&mut state);
        }
        assert!(destination_of(&state).is_none());
        for _ in 0..10 {
            harness.execute(&mut state);
        }
        let destination = destination_of(&state).expect("destination picked");

        let dist = destination.distance(Vec2Fixed::ZERO);
        assert!(dist >= Fixed::from_num(1.49) && dist <= Fixed::from_num(5.01));
        assert!(harness
            .events
            .iter()
            .any(|e| matches!(e, AiEvent::PatrolDestination { .. })));
    }

    #[test]
    fn test_walks_to_destination_and_waits_again() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut state = patrolling(&harness);
        harness.enter(&mut state);

        let mut arrived = false;
        let mut walked = false;
        for _ in 0..600 {
            harness.execute(&mut state);
            if harness.actor.velocity != Vec2Fixed::ZERO {
                walked = true;
                let step = harness.actor.velocity * harness.dt;
                harness.actor.position += step;
            } else if walked {
                arrived = true;
                break;
            }
        }
        assert!(arrived, "never reached the destination");
        assert!(destination_of(&state).is_none());
    }

    #[test]
    fn test_enter_clears_destination() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut state = patrolling(&harness);
        harness.enter(&mut state);
        for _ in 0..120 {
            harness.execute(&mut state);
        }
        assert!(destination_of(&state).is_some());

        harness.enter(&mut state);
        assert!(destination_of(&state).is_none());
    }
}
