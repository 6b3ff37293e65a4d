//! SQLite-backed key-value store over the `kv_entries` table.
//!
//! # Invariants
//! - Each `set` is a single `INSERT ... ON CONFLICT` statement, so a failed
//!   write leaves the previous row intact.
//! - Connections are bootstrapped through `db::open_db*` before use.

use super::{KeyValueStore, KvError, KvResult};
use crate::db::{apply_capacity_limit, open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

/// Durable store for desktop and CLI hosts.
pub struct SqliteKeyValueStore {
    conn: Connection,
    capacity_bytes: Option<u64>,
}

impl SqliteKeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already went through `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            capacity_bytes: None,
        }
    }

    /// Caps the database file size; oversized writes then fail with
    /// `SQLITE_FULL`.
    pub fn with_capacity_limit(mut self, max_bytes: u64) -> Result<Self, DbError> {
        apply_capacity_limit(&self.conn, max_bytes)?;
        self.capacity_bytes = Some(max_bytes);
        Ok(self)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(kv_error)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )
            .map(|_| ())
            .map_err(kv_error)
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", params![key])
            .map(|_| ())
            .map_err(kv_error)
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")
            .map_err(kv_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(kv_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(kv_error)
    }

    fn capacity_bytes(&self) -> Option<u64> {
        self.capacity_bytes
    }
}

/// Maps SQLite failures to a `KvError` carrying the SQLite result-code name.
fn kv_error(err: rusqlite::Error) -> KvError {
    let code = match err.sqlite_error_code() {
        Some(ErrorCode::DiskFull) => Some("SQLITE_FULL"),
        Some(ErrorCode::TooBig) => Some("SQLITE_TOOBIG"),
        Some(ErrorCode::DatabaseBusy) => Some("SQLITE_BUSY"),
        Some(ErrorCode::ReadOnly) => Some("SQLITE_READONLY"),
        _ => None,
    };
    KvError::new(code, err.to_string())
}
