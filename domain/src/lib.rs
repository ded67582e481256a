//! Domain library for the user repository workspace.
//!
//! Holds the `User` entity, the `UserRepository` port, the error taxonomy
//! shared by every backend, and the in-memory backend. Storage engines with
//! external dependencies live in their own adapter crates.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-assigned identifier of a user; unique within one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything distinguished by a stable identifier rather than its attributes.
pub trait Entity {
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    fn id(&self) -> Self::Id;

    /// True when both values denote the same record, whatever their attributes.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// A stored user record.
///
/// `PartialEq` compares every field; use [`Entity::same_identity`] to ask
/// whether two values refer to the same record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User(id={}, name='{}', email='{}')",
            self.id, self.name, self.email
        )
    }
}

/// Input data for a user whose id is assigned by an [`IdGenerator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Source of fresh user ids, injected wherever users are built.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> UserId;
}

/// Repository port for persisting and loading users.
///
/// Every backend follows the same contract:
/// - `add` fails with [`CoreError::DuplicateKey`] when the id is taken and
///   leaves the stored record untouched.
/// - reads hand out independent copies; mutating them never changes storage.
/// - `get_all` returns records in ascending id order.
/// - `delete` of an absent id is a no-op.
pub trait UserRepository: Send + Sync {
    fn add(&self, user: User) -> Result<(), CoreError>;
    fn get_by_id(&self, id: UserId) -> Result<Option<User>, CoreError>;
    fn get_all(&self) -> Result<Vec<User>, CoreError>;
    fn delete(&self, id: UserId) -> Result<(), CoreError>;
}

impl<T: UserRepository + ?Sized> UserRepository for Box<T> {
    fn add(&self, user: User) -> Result<(), CoreError> {
        (**self).add(user)
    }

    fn get_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> Result<Vec<User>, CoreError> {
        (**self).get_all()
    }

    fn delete(&self, id: UserId) -> Result<(), CoreError> {
        (**self).delete(id)
    }
}

impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    fn add(&self, user: User) -> Result<(), CoreError> {
        (**self).add(user)
    }

    fn get_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> Result<Vec<User>, CoreError> {
        (**self).get_all()
    }

    fn delete(&self, id: UserId) -> Result<(), CoreError> {
        (**self).delete(id)
    }
}

/// Errors surfaced by every repository backend.
///
/// A missing record is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("user {0} already exists")]
    DuplicateKey(UserId),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Return a short about/version line for binaries to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}", pkg, ver)
}

pub mod adapters;
pub mod events;
pub mod factory;
pub mod service;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_display_matches_record_form() {
        let u = User::new(1, "Alice", "alice@example.com");
        assert_eq!(
            u.to_string(),
            "User(id=1, name='Alice', email='alice@example.com')"
        );
    }

    #[test]
    fn identity_ignores_attributes() {
        let a = User::new(7, "Alice", "alice@example.com");
        let b = User::new(7, "Alicia", "other@example.com");
        assert!(a.same_identity(&b));
        assert_ne!(a, b);
        assert!(!a.same_identity(&User::new(8, "Alice", "alice@example.com")));
    }

    #[test]
    fn user_id_serializes_as_plain_integer() {
        let u = User::new(3, "Bob", "bob@example.com");
        let json = serde_json::to_string(&u).expect("serialize");
        assert_eq!(json, r#"{"id":3,"name":"Bob","email":"bob@example.com"}"#);
    }

    #[test]
    fn duplicate_key_message_names_the_id() {
        let err = CoreError::DuplicateKey(UserId::new(42));
        assert_eq!(err.to_string(), "user 42 already exists");
    }

    #[test]
    fn boxed_trait_object_delegates() {
        let repo: Box<dyn UserRepository> =
            Box::new(adapters::memory_repo::InMemoryUserRepo::new());
        repo.add(User::new(1, "Alice", "alice@example.com")).unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 1);
    }
}
