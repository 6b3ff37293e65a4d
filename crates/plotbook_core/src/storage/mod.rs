//! Durable key-value storage and the document persistence gateway.
//!
//! # Responsibility
//! - Define the string key-value contract the engine persists through.
//! - Provide SQLite and in-memory backends.
//! - Load, validate, repair, migrate, and save the single document.
//! - Manage migration and pre-import backups.
//!
//! # Invariants
//! - A write either replaces the whole value under a key or leaves the
//!   previous value untouched.
//! - Backend failures carry a platform error `code` when one exists so
//!   capacity failures can be classified by signature.
//!
//! # See also
//! - `crate::migration` for the chain run during `DocumentStore::load`.

pub mod backup;
mod capacity;
mod gateway;
mod memory;
mod sqlite;

pub use backup::{BackupEnvelope, ImportReport, EXPORT_VERSION};
pub use capacity::{format_bytes, is_capacity_exceeded};
pub use gateway::{
    BackupEntry, BackupKind, DocumentStore, LoadOutcome, LoadReport, StorageError, StorageResult,
    StorageStats,
};
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type KvResult<T> = Result<T, KvError>;

/// Backend failure as reported by the underlying store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvError {
    /// Platform error name or numeric code (`QuotaExceededError`, `22`,
    /// `SQLITE_FULL`).
    pub code: Option<String>,
    pub message: String,
}

impl KvError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for KvError {}

/// String-keyed durable store holding whole serialized values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&mut self, key: &str) -> KvResult<()>;
    /// All keys currently stored, sorted ascending.
    fn keys(&self) -> KvResult<Vec<String>>;
    /// Byte quota enforced by the backend, when known.
    fn capacity_bytes(&self) -> Option<u64> {
        None
    }
}
