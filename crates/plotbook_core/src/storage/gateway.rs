//! Document persistence gateway.
//!
//! # Responsibility
//! - Read the single document, classify decode/validation failures, repair
//!   or migrate it, and return a typed `Document`.
//! - Persist upgraded documents immediately after a repair or migration.
//! - Classify write failures and report capacity problems with a size.
//! - Manage `<key>-backup-v<N>` snapshots and report storage usage.
//!
//! # Invariants
//! - A failed write leaves the previously stored value untouched.
//! - Migration backups are best-effort and never abort a load.
//! - Every `Loaded` document decoded from a value that validated.

use super::capacity::{format_bytes, is_capacity_exceeded};
use super::{KeyValueStore, KvError};
use crate::config::{backup_key, EngineConfig};
use crate::context::EngineContext;
use crate::migration::{
    mark_started, migrate, needs_migration, stored_version, MigrationError, MigrationOutcome,
};
use crate::model::document::Document;
use crate::schema::{repair, validate};
use log::{error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    /// Stored bytes are not well-formed JSON.
    Decode(String),
    /// Well-formed but schema-incompatible, and repair did not help.
    Validation(Vec<String>),
    /// Migrated value still does not match the typed document.
    Incompatible(String),
    CapacityExceeded { bytes: u64, size: String },
    Migration(MigrationError),
    Serialization(String),
    Backend(KvError),
    BackupNotFound(String),
    NoDocument,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(message) => write!(f, "stored document is corrupted: {message}"),
            Self::Validation(errors) => {
                write!(f, "stored document is invalid: {}", errors.join("; "))
            }
            Self::Incompatible(message) => {
                write!(f, "document does not match the current schema: {message}")
            }
            Self::CapacityExceeded { size, .. } => write!(
                f,
                "storage is full; the document needs about {size}. Remove old backups or export and clear data"
            ),
            Self::Migration(err) => write!(f, "{err}"),
            Self::Serialization(message) => write!(f, "failed to serialize document: {message}"),
            Self::Backend(err) => write!(f, "storage failure: {err}"),
            Self::BackupNotFound(key) => write!(f, "backup not found: {key}"),
            Self::NoDocument => write!(f, "no document stored"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Migration(err) => Some(err),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MigrationError> for StorageError {
    fn from(value: MigrationError) -> Self {
        Self::Migration(value)
    }
}

impl From<KvError> for StorageError {
    fn from(value: KvError) -> Self {
        Self::Backend(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored yet; first-run initialization is up to the caller.
    Empty,
    Loaded(LoadReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub document: Document,
    pub repaired: bool,
    /// Stored version when a migration ran.
    pub migrated_from: Option<u32>,
    pub applied_steps: Vec<&'static str>,
    /// An interrupted migration was detected and resumed.
    pub resumed: bool,
    /// The upgraded document was written back. Only meaningful when a
    /// repair or migration happened.
    pub persisted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BackupKind {
    Migration { from_version: u32 },
    PreImport { timestamp_millis: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub key: String,
    pub kind: BackupKind,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageStats {
    pub document_bytes: u64,
    /// Keys plus values of every entry under the storage key prefix.
    pub total_bytes: u64,
    pub backup_count: usize,
    pub quota_bytes: Option<u64>,
    pub percent_used: Option<f64>,
}

impl StorageStats {
    pub fn document_size_label(&self) -> String {
        format_bytes(self.document_bytes)
    }
}

/// Persistence gateway over one key-value backend.
pub struct DocumentStore<S: KeyValueStore> {
    pub(super) kv: S,
    pub(super) key: String,
    pub(super) ctx: EngineContext,
}

impl<S: KeyValueStore> DocumentStore<S> {
    /// Creates a gateway with the wall clock and random ids.
    pub fn new(kv: S, config: &EngineConfig) -> Self {
        Self::with_context(kv, config, EngineContext::system())
    }

    pub fn with_context(kv: S, config: &EngineConfig, ctx: EngineContext) -> Self {
        Self {
            kv,
            key: config.storage_key.clone(),
            ctx,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Reads, validates, repairs or migrates, and decodes the document.
    ///
    /// # Errors
    /// - `Decode` when the stored bytes are not JSON; no repair is tried.
    /// - `Validation` when the value is invalid and unrepairable.
    /// - `Migration` when the stored version is unsupported or a step fails.
    pub fn load(&mut self) -> StorageResult<LoadOutcome> {
        let started_at = Instant::now();
        let Some(raw) = self.kv.get(&self.key)? else {
            info!("event=document_load module=storage status=ok result=empty");
            return Ok(LoadOutcome::Empty);
        };

        let value: Value = serde_json::from_str(&raw).map_err(|err| {
            error!(
                "event=document_load module=storage status=error error_code=decode_failed bytes={}",
                raw.len()
            );
            StorageError::Decode(err.to_string())
        })?;

        let (value, repaired) = self.validate_or_repair(value)?;
        let outcome = self.run_migration(value, &raw)?;
        let migrated_from = (!outcome.is_noop()).then_some(outcome.from_version);

        let document: Document = serde_json::from_value(outcome.document).map_err(|err| {
            error!(
                "event=document_load module=storage status=error error_code=typed_decode_failed"
            );
            StorageError::Incompatible(err.to_string())
        })?;

        let mut report = LoadReport {
            document,
            repaired,
            migrated_from,
            applied_steps: outcome.applied,
            resumed: outcome.resumed,
            persisted: false,
        };

        if repaired || migrated_from.is_some() {
            match self.save(&report.document) {
                Ok(saved) => {
                    report.document = saved;
                    report.persisted = true;
                }
                Err(err) => warn!(
                    "event=document_persist_upgrade module=storage status=warn error={}",
                    err
                ),
            }
        }

        info!(
            "event=document_load module=storage status=ok bytes={} version={} repaired={} migrated_from={:?} duration_ms={}",
            raw.len(),
            report.document.version,
            report.repaired,
            report.migrated_from,
            started_at.elapsed().as_millis()
        );
        Ok(LoadOutcome::Loaded(report))
    }

    /// Stamps `meta.updatedAt`, serializes and writes the document.
    ///
    /// Returns the stamped copy that was written.
    pub fn save(&mut self, document: &Document) -> StorageResult<Document> {
        let mut stamped = document.clone();
        stamped.meta.updated_at = self.ctx.timestamp();
        let serialized = serde_json::to_string(&stamped)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.write_raw(&serialized)?;
        Ok(stamped)
    }

    /// Replaces the document with the migration backup taken before leaving
    /// `version`, then loads it (migrating again).
    pub fn restore_from_backup(&mut self, version: u32) -> StorageResult<LoadReport> {
        let key = backup_key(&self.key, version);
        let raw = self
            .kv
            .get(&key)?
            .ok_or_else(|| StorageError::BackupNotFound(key.clone()))?;

        let value: Value =
            serde_json::from_str(&raw).map_err(|err| StorageError::Decode(err.to_string()))?;
        let report = validate(&value);
        if !report.valid && repair(&value, &mut self.ctx).is_none() {
            return Err(StorageError::Validation(report.errors));
        }

        self.write_raw(&raw)?;
        info!(
            "event=backup_restore module=storage status=ok from_version={} bytes={}",
            version,
            raw.len()
        );

        match self.load()? {
            LoadOutcome::Loaded(report) => Ok(report),
            LoadOutcome::Empty => Err(StorageError::NoDocument),
        }
    }

    /// Backups under this store's key, migration snapshots first (by
    /// version), then pre-import snapshots (by time).
    pub fn list_backups(&self) -> StorageResult<Vec<BackupEntry>> {
        let migration_prefix = format!("{}-backup-v", self.key);
        let import_prefix = format!("{}-pre-import-", self.key);

        let mut entries = Vec::new();
        for key in self.kv.keys()? {
            let kind = if let Some(version) = key
                .strip_prefix(migration_prefix.as_str())
                .and_then(|suffix| suffix.parse::<u32>().ok())
            {
                BackupKind::Migration {
                    from_version: version,
                }
            } else if let Some(timestamp_millis) = key
                .strip_prefix(import_prefix.as_str())
                .and_then(|suffix| suffix.parse::<i64>().ok())
            {
                BackupKind::PreImport { timestamp_millis }
            } else {
                continue;
            };

            let bytes = self.kv.get(&key)?.map_or(0, |value| value.len() as u64);
            entries.push(BackupEntry { key, kind, bytes });
        }

        entries.sort_by(|left, right| left.kind.cmp(&right.kind));
        Ok(entries)
    }

    pub fn storage_stats(&self) -> StorageResult<StorageStats> {
        let mut document_bytes = 0;
        let mut total_bytes = 0;
        for key in self.kv.keys()? {
            if !key.starts_with(self.key.as_str()) {
                continue;
            }
            if let Some(value) = self.kv.get(&key)? {
                total_bytes += (key.len() + value.len()) as u64;
                if key == self.key {
                    document_bytes = value.len() as u64;
                }
            }
        }

        let quota_bytes = self.kv.capacity_bytes();
        let percent_used = quota_bytes
            .filter(|quota| *quota > 0)
            .map(|quota| total_bytes as f64 / quota as f64 * 100.0);

        Ok(StorageStats {
            document_bytes,
            total_bytes,
            backup_count: self.list_backups()?.len(),
            quota_bytes,
            percent_used,
        })
    }

    /// Serialized size of the stored document in bytes.
    pub fn document_size(&self) -> StorageResult<Option<u64>> {
        Ok(self.kv.get(&self.key)?.map(|raw| raw.len() as u64))
    }

    /// Removes the document; backups are left in place.
    pub fn clear(&mut self) -> StorageResult<()> {
        self.kv.remove(&self.key)?;
        warn!("event=document_clear module=storage status=ok");
        Ok(())
    }

    pub(super) fn write_raw(&mut self, serialized: &str) -> StorageResult<()> {
        let bytes = serialized.len() as u64;
        match self.kv.set(&self.key, serialized) {
            Ok(()) => {
                info!("event=document_save module=storage status=ok bytes={bytes}");
                Ok(())
            }
            Err(err) if is_capacity_exceeded(&err) => {
                let size = format_bytes(bytes);
                error!(
                    "event=document_save module=storage status=error error_code=capacity_exceeded bytes={} size={}",
                    bytes, size
                );
                Err(StorageError::CapacityExceeded { bytes, size })
            }
            Err(err) => {
                error!(
                    "event=document_save module=storage status=error error_code=backend_failed bytes={} error={}",
                    bytes, err
                );
                Err(StorageError::Backend(err))
            }
        }
    }

    fn validate_or_repair(&mut self, value: Value) -> StorageResult<(Value, bool)> {
        let report = validate(&value);
        if report.valid {
            return Ok((value, false));
        }

        match repair(&value, &mut self.ctx) {
            Some(repaired) => {
                warn!(
                    "event=document_repair module=schema status=ok error_count={}",
                    report.errors.len()
                );
                Ok((repaired, true))
            }
            None => {
                error!(
                    "event=document_repair module=schema status=error error_code=unrepairable error_count={}",
                    report.errors.len()
                );
                Err(StorageError::Validation(report.errors))
            }
        }
    }

    fn run_migration(&mut self, value: Value, raw: &str) -> StorageResult<MigrationOutcome> {
        if !needs_migration(&value)? {
            return Ok(migrate(value, &mut self.ctx)?);
        }

        let from_version = stored_version(&value)?;
        self.write_migration_backup(from_version, raw);

        let marked = mark_started(value, &self.ctx)?;
        match serde_json::to_string(&marked) {
            Ok(serialized) => {
                if let Err(err) = self.kv.set(&self.key, &serialized) {
                    warn!(
                        "event=migration_marker module=migration status=warn error={}",
                        err
                    );
                }
            }
            Err(err) => warn!(
                "event=migration_marker module=migration status=warn error={}",
                err
            ),
        }

        migrate(marked, &mut self.ctx).map_err(|err| {
            error!(
                "event=migration_run module=migration status=error from_version={} error={}",
                from_version, err
            );
            StorageError::Migration(err)
        })
    }

    /// Best-effort snapshot of the stored bytes; an existing snapshot for
    /// the same version is kept.
    fn write_migration_backup(&mut self, from_version: u32, raw: &str) {
        let key = backup_key(&self.key, from_version);
        match self.kv.get(&key) {
            Ok(Some(_)) => {
                info!(
                    "event=backup_write module=storage status=ok from_version={from_version} result=exists"
                );
                return;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(
                    "event=backup_write module=storage status=warn from_version={} error={}",
                    from_version, err
                );
                return;
            }
        }

        match self.kv.set(&key, raw) {
            Ok(()) => info!(
                "event=backup_write module=storage status=ok from_version={} bytes={}",
                from_version,
                raw.len()
            ),
            Err(err) => warn!(
                "event=backup_write module=storage status=warn from_version={} error={}",
                from_version, err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentStore, LoadOutcome, StorageError};
    use crate::config::EngineConfig;
    use crate::context::EngineContext;
    use crate::model::document::Document;
    use crate::storage::{KeyValueStore, MemoryKeyValueStore};

    fn store(kv: MemoryKeyValueStore) -> DocumentStore<MemoryKeyValueStore> {
        let ctx = EngineContext::deterministic("2025-04-02T09:30:00Z".parse().unwrap());
        DocumentStore::with_context(kv, &EngineConfig::default(), ctx)
    }

    #[test]
    fn empty_store_loads_as_empty() {
        assert_eq!(store(MemoryKeyValueStore::new()).load().unwrap(), LoadOutcome::Empty);
    }

    #[test]
    fn malformed_bytes_are_a_decode_error_and_stay_untouched() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("allotment-unified-data", "{not json").unwrap();
        let mut store = store(kv);

        assert!(matches!(store.load(), Err(StorageError::Decode(_))));
        assert_eq!(
            store.kv().get("allotment-unified-data").unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn save_stamps_updated_at() {
        let mut store = store(MemoryKeyValueStore::new());
        let document = Document::new("Plot 7", 2025, "2020-01-01T00:00:00.000Z");

        let saved = store.save(&document).unwrap();
        assert_eq!(saved.meta.updated_at, "2025-04-02T09:30:00.000Z");
        assert_eq!(saved.meta.created_at, "2020-01-01T00:00:00.000Z");
    }
}
