use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::{CoreError, User, UserId, UserRepository};

/// In-memory user repository. Records live for as long as the value does.
///
/// Keyed by id, so iteration yields ascending id order and a second `add`
/// with the same id is detected up front. Reads clone out of the map.
pub struct InMemoryUserRepo {
    inner: Mutex<BTreeMap<UserId, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of stored users.
    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<UserId, User>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Storage("mutex poisoned".into()))
    }
}

impl Default for InMemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryUserRepo {
    fn add(&self, user: User) -> Result<(), CoreError> {
        let mut map = self.lock()?;
        if map.contains_key(&user.id) {
            return Err(CoreError::DuplicateKey(user.id));
        }
        debug!(id = %user.id, "memory: add user");
        map.insert(user.id, user);
        Ok(())
    }

    fn get_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        let map = self.lock()?;
        Ok(map.get(&id).cloned())
    }

    fn get_all(&self) -> Result<Vec<User>, CoreError> {
        let map = self.lock()?;
        Ok(map.values().cloned().collect())
    }

    fn delete(&self, id: UserId) -> Result<(), CoreError> {
        let mut map = self.lock()?;
        if map.remove(&id).is_some() {
            debug!(id = %id, "memory: deleted user");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new(1, "Alice", "alice@example.com")
    }

    #[test]
    fn add_then_get_returns_equal_record() {
        let repo = InMemoryUserRepo::new();
        repo.add(alice()).unwrap();
        let got = repo.get_by_id(UserId::new(1)).unwrap();
        assert_eq!(got, Some(alice()));
    }

    #[test]
    fn get_missing_is_none() {
        let repo = InMemoryUserRepo::new();
        assert!(repo.get_by_id(UserId::new(99)).unwrap().is_none());
    }

    #[test]
    fn duplicate_id_is_rejected_and_original_kept() {
        let repo = InMemoryUserRepo::new();
        repo.add(alice()).unwrap();
        let err = repo
            .add(User::new(1, "Mallory", "mallory@example.com"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey(id) if id == UserId::new(1)));
        assert_eq!(repo.get_by_id(UserId::new(1)).unwrap(), Some(alice()));
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[test]
    fn get_all_is_ordered_by_id() {
        let repo = InMemoryUserRepo::new();
        for id in [3, 1, 2] {
            repo.add(User::new(id, format!("u{id}"), format!("u{id}@e.com")))
                .unwrap();
        }
        let ids: Vec<i64> = repo.get_all().unwrap().iter().map(|u| u.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn delete_absent_is_noop() {
        let repo = InMemoryUserRepo::new();
        repo.add(alice()).unwrap();
        repo.delete(UserId::new(5)).unwrap();
        assert_eq!(repo.get_all().unwrap(), vec![alice()]);
    }

    #[test]
    fn returned_records_are_copies() {
        let repo = InMemoryUserRepo::new();
        repo.add(alice()).unwrap();

        let mut fetched = repo.get_by_id(UserId::new(1)).unwrap().unwrap();
        fetched.name = "Changed".into();
        let mut all = repo.get_all().unwrap();
        all[0].email = "changed@example.com".into();

        assert_eq!(repo.get_by_id(UserId::new(1)).unwrap(), Some(alice()));
    }

    #[test]
    fn is_empty_after_delete() {
        let repo = InMemoryUserRepo::new();
        assert!(repo.is_empty().unwrap());
        repo.add(alice()).unwrap();
        assert!(!repo.is_empty().unwrap());
        repo.delete(UserId::new(1)).unwrap();
        assert!(repo.is_empty().unwrap());
    }
}
