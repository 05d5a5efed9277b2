//! Session-scoped key/value storage.
//!
//! # Responsibility
//! - Persist small UI preferences (the active tab) across a reload within
//!   one session.
//! - Forget them when the session ends.
//!
//! # Invariants
//! - Values written under one session id are invisible to other sessions.
//! - `clear()` removes every value of the current session.
//! - SQLite rows older than [`SESSION_TTL_MS`] are purged on open, so
//!   abandoned sessions do not become durable state.

use crate::db::{open_db, open_db_in_memory, DbError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

/// Rows untouched for this long belong to a dead session.
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Session id is blank after trim.
    InvalidSessionId,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidSessionId => write!(f, "session id must not be blank"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidSessionId => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key/value storage that lives as long as one host session.
pub trait SessionStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn clear(&mut self) -> StorageResult<()>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Box<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn clear(&mut self) -> StorageResult<()> {
        (**self).clear()
    }
}

/// Process-local storage; a "reload" means reusing the same instance.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    values: HashMap<String, String>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.values.clear();
        Ok(())
    }
}

/// SQLite-backed storage keyed by host session id.
///
/// Reopening the same file with the same session id restores the values,
/// which is how a host reload within one session is modeled.
pub struct SqliteSessionStorage {
    conn: Connection,
    session_id: String,
}

impl SqliteSessionStorage {
    /// Opens the storage file for `session_id`.
    ///
    /// # Errors
    /// - Returns an error when the session id is blank.
    /// - Returns an error when the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>, session_id: &str) -> StorageResult<Self> {
        let session_id = normalize_session_id(session_id)?;
        let conn = open_db(path)?;
        Self::with_connection(conn, session_id)
    }

    pub fn open_in_memory(session_id: &str) -> StorageResult<Self> {
        let session_id = normalize_session_id(session_id)?;
        let conn = open_db_in_memory()?;
        Self::with_connection(conn, session_id)
    }

    /// Generates a fresh session id for hosts that do not supply one.
    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn with_connection(conn: Connection, session_id: String) -> StorageResult<Self> {
        let purged = conn.execute(
            "DELETE FROM session_state
             WHERE updated_at < (CAST(strftime('%s', 'now') AS INTEGER) * 1000) - ?1;",
            [SESSION_TTL_MS],
        )?;
        if purged > 0 {
            info!("event=session_storage_purge module=repo status=ok rows={purged}");
        }
        Ok(Self { conn, session_id })
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM session_state WHERE session_id = ?1 AND key = ?2;",
                params![self.session_id, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO session_state (session_id, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (session_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000);",
            params![self.session_id, key, value],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM session_state WHERE session_id = ?1;",
            [self.session_id.as_str()],
        )?;
        Ok(())
    }
}

fn normalize_session_id(raw: &str) -> StorageResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidSessionId);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{MemorySessionStorage, SessionStorage, SqliteSessionStorage, StorageError};

    #[test]
    fn memory_storage_set_get_clear() {
        let mut storage = MemorySessionStorage::new();
        assert_eq!(storage.get("selectedTab").expect("get should succeed"), None);

        storage.set("selectedTab", "list").expect("set should succeed");
        let stored = storage.get("selectedTab").expect("get should succeed");
        assert_eq!(stored.as_deref(), Some("list"));

        storage.clear().expect("clear should succeed");
        assert_eq!(storage.get("selectedTab").expect("get should succeed"), None);
    }

    #[test]
    fn sqlite_storage_rejects_blank_session_id() {
        let err = SqliteSessionStorage::open_in_memory("  ")
            .err()
            .expect("blank session id should be rejected");
        assert!(matches!(err, StorageError::InvalidSessionId));
    }

    #[test]
    fn sqlite_storage_overwrites_existing_value() {
        let mut storage =
            SqliteSessionStorage::open_in_memory("s-1").expect("in-memory storage should open");
        storage.set("selectedTab", "cards").expect("first set should succeed");
        storage.set("selectedTab", "heatmap").expect("overwrite should succeed");
        let stored = storage.get("selectedTab").expect("get should succeed");
        assert_eq!(stored.as_deref(), Some("heatmap"));
    }

    #[test]
    fn generated_session_ids_are_unique() {
        assert_ne!(
            SqliteSessionStorage::generate_session_id(),
            SqliteSessionStorage::generate_session_id()
        );
    }
}
