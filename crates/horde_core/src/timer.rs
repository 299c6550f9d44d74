//! Countdown timer used for cooldowns, windups, reactions and waits.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// A scalar counting down by elapsed tick time.
///
/// Elapsed once the remaining time is at or below zero. Ticking never
/// clamps, so overshoot is visible through [`Timer::remaining`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timer {
    #[serde(with = "fixed_serde")]
    remaining: Fixed,
}

impl Timer {
    /// Create a timer armed with `duration` seconds.
    #[must_use]
    pub const fn new(duration: Fixed) -> Self {
        Self {
            remaining: duration,
        }
    }

    /// Create a timer that is already elapsed.
    #[must_use]
    pub const fn elapsed() -> Self {
        Self {
            remaining: Fixed::ZERO,
        }
    }

    /// Advance the timer by `dt` seconds.
    pub fn tick(&mut self, dt: Fixed) {
        if self.remaining > Fixed::ZERO {
            self.remaining -= dt;
        }
    }

    /// Whether the countdown has finished.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.remaining <= Fixed::ZERO
    }

    /// Rearm the timer with a new duration.
    pub fn reset(&mut self, duration: Fixed) {
        self.remaining = duration;
    }

    /// Seconds left (may be negative after overshoot).
    #[must_use]
    pub fn remaining(&self) -> Fixed {
        self.remaining
    }
}
