//! State machine core: owns the active [`AiState`] and runs its hooks.
//!
//! Transition protocol: `exit(old)` runs exactly once, the value is
//! swapped, then `enter(new)` runs exactly once. Dead is terminal and
//! ignores every further request.

use tracing::debug;

use crate::events::AiEvent;
use crate::states::{AiState, AiStateKind, ExitReason, StateContext, Transition};

/// Drives one actor's active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    current: AiState,
    started: bool,
    enters: u64,
    exits: u64,
}

impl StateMachine {
    /// Create a machine in `initial`. Nothing runs until [`Self::start`].
    #[must_use]
    pub fn new(initial: AiState) -> Self {
        Self {
            current: initial,
            started: false,
            enters: 0,
            exits: 0,
        }
    }

    /// Active state.
    #[must_use]
    pub fn current(&self) -> &AiState {
        &self.current
    }

    /// Active state kind.
    #[must_use]
    pub fn kind(&self) -> AiStateKind {
        self.current.kind()
    }

    /// Whether the machine has reached its terminal state.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current.is_dead()
    }

    /// Number of `enter` hooks run so far.
    #[must_use]
    pub fn enters(&self) -> u64 {
        self.enters
    }

    /// Number of `exit` hooks run so far.
    #[must_use]
    pub fn exits(&self) -> u64 {
        self.exits
    }

    /// Enter the initial state. Idempotent.
    pub fn start(&mut self, ctx: &mut StateContext<'_>) {
        if self.started {
            return;
        }
        self.started = true;
        self.run_enter(ctx);
    }

    /// Switch to `next`.
    ///
    /// `None` and requests against a dead machine are no-ops. A value equal
    /// to the current one is still re-entered; callers that want to avoid
    /// resetting timers filter by kind first. Returns whether a transition
    /// happened.
    pub fn change_state(&mut self, next: Option<AiState>, ctx: &mut StateContext<'_>) -> bool {
        let Some(next) = next else {
            return false;
        };
        if self.current.is_dead() {
            debug!(
                actor = ctx.actor_id(),
                requested = next.kind().name(),
                "Ignoring transition on dead actor"
            );
            return false;
        }
        if !self.started {
            self.current = next;
            self.start(ctx);
            return true;
        }
        self.swap(next, ExitReason::Transition, ctx);
        true
    }

    /// Force the terminal state, interrupting whatever is running.
    ///
    /// The current state exits with [`ExitReason::Death`] and any held token
    /// is released. Returns `false` if already dead.
    pub fn die(&mut self, ctx: &mut StateContext<'_>) -> bool {
        if self.current.is_dead() {
            return false;
        }
        if !self.started {
            self.current = AiState::dead();
            self.start(ctx);
            ctx.arbiter.release_token();
            return true;
        }
        self.swap(AiState::dead(), ExitReason::Death, ctx);
        ctx.arbiter.release_token();
        true
    }

    /// Execute the active state once and apply what it asks for.
    ///
    /// Returns `true` when the actor should be removed.
    pub fn tick(&mut self, ctx: &mut StateContext<'_>) -> bool {
        self.start(ctx);
        let handlers = self.current.kind().handlers();
        match (handlers.execute)(&mut self.current, ctx) {
            Transition::Stay => false,
            Transition::Change(next) => {
                self.change_state(Some(next), ctx);
                false
            }
            Transition::Despawn => true,
        }
    }

    fn swap(&mut self, next: AiState, reason: ExitReason, ctx: &mut StateContext<'_>) {
        let from = self.current.kind();
        let handlers = from.handlers();
        (handlers.exit)(&mut self.current, ctx, reason);
        self.exits += 1;

        self.current = next;
        let to = self.current.kind();
        debug!(actor = ctx.actor_id(), from = from.name(), to = to.name(), "State change");
        ctx.emit(AiEvent::StateChanged {
            actor: ctx.actor_id(),
            from,
            to,
        });
        self.run_enter(ctx);
    }

    fn run_enter(&mut self, ctx: &mut StateContext<'_>) {
        let handlers = self.current.kind().handlers();
        (handlers.enter)(&mut self.current, ctx);
        self.enters += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ActorConfig;
    use crate::math::{Fixed, Vec2Fixed};
    use crate::states::test_support::{Harness, ACTOR};

    fn started(harness: &mut Harness, initial: AiState) -> StateMachine {
        let mut machine = StateMachine::new(initial);
        machine.start(&mut harness.ctx());
        machine
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::idle());
        machine.start(&mut harness.ctx());
        assert_eq!(machine.enters(), 1);
        assert_eq!(machine.exits(), 0);
    }

    #[test]
    fn test_change_exits_then_enters() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::idle());

        assert!(machine.change_state(Some(AiState::chase(Fixed::ONE)), &mut harness.ctx()));
        assert_eq!(machine.kind(), AiStateKind::Chase);
        assert_eq!(machine.enters(), 2);
        assert_eq!(machine.exits(), 1);
        assert_eq!(
            harness.events.last(),
            Some(&AiEvent::StateChanged {
                actor: ACTOR,
                from: AiStateKind::Idle,
                to: AiStateKind::Chase,
            })
        );
    }

    #[test]
    fn test_none_is_noop() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::idle());
        assert!(!machine.change_state(None, &mut harness.ctx()));
        assert_eq!(machine.exits(), 0);
        assert!(harness.events.is_empty());
    }

    #[test]
    fn test_same_kind_reenters() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::chase(Fixed::ONE));
        assert!(machine.change_state(Some(AiState::chase(Fixed::ZERO)), &mut harness.ctx()));
        assert_eq!(machine.enters(), 2);
        assert!(!machine.current().is_committed());
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::idle());
        assert!(machine.die(&mut harness.ctx()));
        assert!(!machine.die(&mut harness.ctx()));
        assert!(!machine.change_state(Some(AiState::idle()), &mut harness.ctx()));
        assert!(machine.is_dead());
        // Balanced except for the terminal state, which is never exited.
        assert_eq!(machine.enters(), machine.exits() + 1);
    }

    #[test]
    fn test_death_mid_attack_releases_token() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO)
            .with_target(Vec2Fixed::from_ints(1, 0));
        assert!(harness.arbiter.request_token(ACTOR));
        let mut machine = started(&mut harness, AiState::attack());

        machine.tick(&mut harness.ctx());
        assert!(harness.arbiter.holds_token(ACTOR));

        machine.die(&mut harness.ctx());
        assert!(!harness.arbiter.holds_token(ACTOR));
        assert!(!harness.actor.collision_enabled);
    }

    #[test]
    fn test_tick_applies_state_transition() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::flee(None));
        let mut despawn = false;
        for _ in 0..400 {
            harness.actor.tick_vitals(harness.dt);
            despawn |= machine.tick(&mut harness.ctx());
        }
        assert!(!despawn);
        assert_eq!(machine.kind(), AiStateKind::Patrol);
    }

    #[test]
    fn test_tick_reports_despawn() {
        let mut harness = Harness::new(ActorConfig::default(), Vec2Fixed::ZERO);
        let mut machine = started(&mut harness, AiState::idle());
        machine.die(&mut harness.ctx());

        let mut ticks = 0;
        while !machine.tick(&mut harness.ctx()) {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!((59..=61).contains(&ticks));
    }
}
