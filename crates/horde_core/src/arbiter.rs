//! Attack arbiter: live-actor registry plus a bounded pool of attack tokens.
//!
//! One arbiter exists per session and is passed explicitly to whoever needs
//! it. Holding a token means "allowed to be in Attack right now". State code
//! only sees an [`ArbiterAccess`] handle, which can request and release the
//! caller's own token and compute separation, nothing else.
//!
//! A denied request is backpressure, not an error: the caller strafes and
//! retries.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::components::EntityId;
use crate::data::ArbiterConfig;
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::steering;

/// Session-wide registry and token pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbiter {
    capacity: usize,
    registry: BTreeMap<EntityId, Vec2Fixed>,
    holders: BTreeSet<EntityId>,
}

impl Arbiter {
    /// Create an arbiter.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AiError::InvalidConfig`] for a zero capacity.
    pub fn new(config: ArbiterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity as usize,
            registry: BTreeMap::new(),
            holders: BTreeSet::new(),
        })
    }

    /// Maximum concurrent token holders.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently held.
    #[must_use]
    pub fn tokens_held(&self) -> usize {
        self.holders.len()
    }

    /// Whether `id` holds a token.
    #[must_use]
    pub fn holds_token(&self, id: EntityId) -> bool {
        self.holders.contains(&id)
    }

    /// Token holders in id order.
    pub fn holders(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.holders.iter().copied()
    }

    /// Whether `id` is in the live registry.
    #[must_use]
    pub fn is_registered(&self, id: EntityId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Number of registered actors.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    /// Add an actor or refresh its position. Idempotent.
    pub fn register(&mut self, id: EntityId, position: Vec2Fixed) {
        if self.registry.insert(id, position).is_none() {
            debug!(actor = id, "Registered with arbiter");
        }
    }

    /// Remove an actor, force-releasing any token it holds. Idempotent.
    pub fn unregister(&mut self, id: EntityId) {
        if self.holders.remove(&id) {
            debug!(actor = id, "Token released on unregister");
        }
        if self.registry.remove(&id).is_some() {
            debug!(actor = id, "Unregistered from arbiter");
        }
    }

    /// Ask for an attack token.
    ///
    /// Returns `true` at once if `id` already holds one; otherwise grants
    /// while fewer than `capacity` tokens are out. Unregistered actors are
    /// always denied.
    pub fn request_token(&mut self, id: EntityId) -> bool {
        if self.holders.contains(&id) {
            return true;
        }
        if !self.registry.contains_key(&id) {
            warn!(actor = id, "Token request from unregistered actor");
            return false;
        }
        if self.holders.len() < self.capacity {
            self.holders.insert(id);
            debug!(actor = id, held = self.holders.len(), "Token granted");
            true
        } else {
            debug!(actor = id, held = self.holders.len(), "Token denied");
            false
        }
    }

    /// Return a token. No-op when none is held.
    pub fn release_token(&mut self, id: EntityId) {
        if self.holders.remove(&id) {
            debug!(actor = id, held = self.holders.len(), "Token released");
        }
    }

    /// Separation vector for `id` against every other registered actor.
    ///
    /// Uses the registered position of `id`; zero if it is not registered.
    #[must_use]
    pub fn separation(&self, id: EntityId, radius: Fixed) -> Vec2Fixed {
        let Some(&subject) = self.registry.get(&id) else {
            return Vec2Fixed::ZERO;
        };
        let neighbors = self
            .registry
            .iter()
            .filter(|(other, _)| **other != id)
            .map(|(_, position)| *position);
        steering::separation(subject, neighbors, radius)
    }

    /// Per-tick maintenance, run before any brain evaluates.
    ///
    /// `live` lists every actor that is still alive with its current
    /// position. Registered actors missing from it are pruned from both the
    /// registry and the token set, so capacity never counts a destroyed
    /// actor. Listed actors that are not registered stay unregistered.
    pub fn maintain<I>(&mut self, live: I)
    where
        I: IntoIterator<Item = (EntityId, Vec2Fixed)>,
    {
        let mut refreshed = BTreeMap::new();
        for (id, position) in live {
            if self.registry.contains_key(&id) {
                refreshed.insert(id, position);
            }
        }

        for stale in self.registry.keys().filter(|id| !refreshed.contains_key(*id)) {
            debug!(actor = *stale, "Pruned stale actor");
        }
        self.registry = refreshed;
        let registry = &self.registry;
        self.holders.retain(|id| registry.contains_key(id));
    }

    /// Drop every registration and token (session end).
    pub fn reset(&mut self) {
        self.registry.clear();
        self.holders.clear();
    }

    /// Restricted handle for one actor's brain and states.
    pub fn access(&mut self, id: EntityId) -> ArbiterAccess<'_> {
        ArbiterAccess { arbiter: self, id }
    }
}

/// What an actor's own brain and states may do with the arbiter.
#[derive(Debug)]
pub struct ArbiterAccess<'a> {
    arbiter: &'a mut Arbiter,
    id: EntityId,
}

impl ArbiterAccess<'_> {
    /// Request a token for this actor.
    pub fn request_token(&mut self) -> bool {
        self.arbiter.request_token(self.id)
    }

    /// Release this actor's token, if held.
    pub fn release_token(&mut self) {
        self.arbiter.release_token(self.id);
    }

    /// Separation vector for this actor.
    #[must_use]
    pub fn separation(&self, radius: Fixed) -> Vec2Fixed {
        self.arbiter.separation(self.id, radius)
    }
}
