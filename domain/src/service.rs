use tracing::{info, warn};

use crate::events::{EventHandler, UserEvent};
use crate::factory::UserFactory;
use crate::{CoreError, IdGenerator, NewUser, User, UserId, UserRepository};

/// Upper bound on generated ids tried by `register` before giving up.
const MAX_ID_ATTEMPTS: usize = 100;

/// First id worth handing to a generator for `repo`: one past the highest
/// stored id, but never below `floor`. Falls back to `floor` when the store
/// already holds `i64::MAX`.
pub fn next_free_id<R: UserRepository + ?Sized>(repo: &R, floor: i64) -> Result<i64, CoreError> {
    let past_max = repo
        .get_all()?
        .last()
        .and_then(|u| u.id.get().checked_add(1));
    Ok(past_max.map_or(floor, |next| next.max(floor)))
}

/// Application service over any `UserRepository`.
///
/// Generic over the storage backend, the id source, and the event sink, so the
/// same workflow runs unchanged against in-memory or SQLite storage.
pub struct UserService<R: UserRepository, G: IdGenerator, H: EventHandler> {
    repo: R,
    factory: UserFactory<G>,
    events: H,
}

impl<R: UserRepository, G: IdGenerator, H: EventHandler> UserService<R, G, H> {
    pub fn new(repo: R, ids: G, events: H) -> Self {
        Self {
            repo,
            factory: UserFactory::new(ids),
            events,
        }
    }

    /// Create a user with a generated id.
    ///
    /// Ids already taken (for instance by users added with explicit ids) are
    /// skipped; the next generated id is tried instead. After
    /// `MAX_ID_ATTEMPTS` collisions the last one is returned as
    /// `DuplicateKey`.
    pub fn register(&self, input: NewUser) -> Result<User, CoreError> {
        let mut last_taken = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let user = self.factory.create(input.clone());
            match self.store(user) {
                Err(CoreError::DuplicateKey(id)) => {
                    warn!(user_id = %id, "generated id already taken, retrying");
                    last_taken = Some(id);
                }
                other => return other,
            }
        }
        match last_taken {
            Some(id) => Err(CoreError::DuplicateKey(id)),
            None => Err(CoreError::Storage("no user id attempts were made".into())),
        }
    }

    /// Store a user whose id was chosen by the caller.
    pub fn add(&self, user: User) -> Result<User, CoreError> {
        self.store(user)
    }

    fn store(&self, user: User) -> Result<User, CoreError> {
        self.repo.add(user.clone())?;
        self.events.handle(&UserEvent::Added {
            id: user.id,
            email: user.email.clone(),
        });
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> Result<Option<User>, CoreError> {
        self.repo.get_by_id(id)
    }

    /// All users in ascending id order.
    pub fn list(&self) -> Result<Vec<User>, CoreError> {
        self.repo.get_all()
    }

    /// Delete a user. Returns whether a record was present.
    pub fn remove(&self, id: UserId) -> Result<bool, CoreError> {
        let existed = self.repo.get_by_id(id)?.is_some();
        self.repo.delete(id)?;
        if existed {
            self.events.handle(&UserEvent::Deleted { id });
        } else {
            info!(user_id = %id, "delete of unknown user ignored");
        }
        Ok(existed)
    }

    /// Borrow the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }
}
