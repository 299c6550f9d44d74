//! Idle: stand still until the brain finds something to do.

use super::{AiState, ExitReason, StateContext, Transition};
use crate::math::Vec2Fixed;

pub(super) fn enter(_state: &mut AiState, ctx: &mut StateContext<'_>) {
    ctx.actor.velocity = Vec2Fixed::ZERO;
}

pub(super) fn execute(_state: &mut AiState, ctx: &mut StateContext<'_>) -> Transition {
    ctx.actor.velocity = Vec2Fixed::ZERO;
    Transition::Stay
}

pub(super) fn exit(_state: &mut AiState, _ctx: &mut StateContext<'_>, _reason: ExitReason) {}
