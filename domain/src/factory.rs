//! Id generation and user construction.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::{IdGenerator, NewUser, User, UserId};

/// Monotonically increasing ids starting at a caller-chosen value.
///
/// Each generator owns its counter, so two generators never share state.
/// The counter saturates at `i64::MAX` instead of wrapping; once there, every
/// call yields `i64::MAX`.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicI64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> UserId {
        let current = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
        match current {
            Ok(id) | Err(id) => UserId::new(id),
        }
    }
}

/// Builds users from [`NewUser`] input, drawing ids from the injected generator.
pub struct UserFactory<G: IdGenerator> {
    ids: G,
}

impl<G: IdGenerator> UserFactory<G> {
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    pub fn create(&self, input: NewUser) -> User {
        User {
            id: self.ids.next_id(),
            name: input.name,
            email: input.email,
        }
    }
}
