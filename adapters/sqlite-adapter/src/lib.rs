//! sqlite-adapter: SQLite implementation of the `UserRepository` port.
//!
//! Purpose
//! - Provide a file-backed repository behind the same contract as the
//!   in-memory backend, so callers can swap one for the other.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - One connection per repository, held for its whole lifetime and closed
//!   on drop.
//! - Writes run inside a transaction that rolls back unless committed.
//! - `rusqlite::Error` never leaves this crate; everything is mapped to
//!   `CoreError`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use domain::{CoreError, User, UserId, UserRepository};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// SQLite-backed user repository.
pub struct SqliteUserRepo {
    conn: Mutex<Connection>,
}

impl SqliteUserRepo {
    /// Open (or create) a database file at `path` and ensure the `users` table.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CoreError::StorageUnavailable(format!("create {}: {e}", dir.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(map_unavailable)?;
        debug!(path = %path.display(), "sqlite: opened database");
        Self::with_connection(conn)
    }

    /// Private database that disappears with the repository.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_unavailable)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Storage("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_unavailable)
}

fn map_sqerr(e: rusqlite::Error) -> CoreError {
    CoreError::Storage(format!("sqlite error: {e}"))
}

fn map_unavailable(e: rusqlite::Error) -> CoreError {
    CoreError::StorageUnavailable(format!("sqlite error: {e}"))
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

impl UserRepository for SqliteUserRepo {
    fn add(&self, user: User) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let res = tx.execute(
            "INSERT INTO users(id, name, email) VALUES (?1, ?2, ?3)",
            params![user.id.get(), user.name, user.email],
        );
        match res {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(CoreError::DuplicateKey(user.id));
            }
            Err(e) => return Err(map_sqerr(e)),
        }
        tx.commit().map_err(map_sqerr)?;
        debug!(id = %user.id, "sqlite: add user");
        Ok(())
    }

    fn get_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, email FROM users WHERE id = ?1",
            params![id.get()],
            row_to_user,
        )
        .optional()
        .map_err(map_sqerr)
    }

    fn get_all(&self) -> Result<Vec<User>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, email FROM users ORDER BY id ASC")
            .map_err(map_sqerr)?;
        let rows = stmt.query_map([], row_to_user).map_err(map_sqerr)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(map_sqerr)
    }

    fn delete(&self, id: UserId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let removed = tx
            .execute("DELETE FROM users WHERE id = ?1", params![id.get()])
            .map_err(map_sqerr)?;
        tx.commit().map_err(map_sqerr)?;
        if removed > 0 {
            debug!(id = %id, "sqlite: deleted user");
        }
        Ok(())
    }
}
