//! Backup envelope export and import.
//!
//! # Responsibility
//! - Wrap the document in a `{allotment, exportedAt, exportVersion}` envelope.
//! - Accept current envelopes, legacy envelopes carrying a separate variety
//!   store, and bare documents.
//! - Snapshot the current document under `<key>-pre-import-<millis>` before
//!   an import overwrites it. An existing snapshot is never overwritten; a
//!   taken millisecond moves the new snapshot to the next free one.
//!
//! # Invariants
//! - Foreign data is validated but never repaired.
//! - Nothing is written unless the imported document validated and migrated.

use super::capacity::{format_bytes, is_capacity_exceeded};
use super::gateway::{DocumentStore, StorageError, StorageResult};
use super::KeyValueStore;
use crate::config::pre_import_key;
use crate::migration::migrate;
use crate::model::document::{Document, CURRENT_SCHEMA_VERSION};
use crate::schema::validate;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope version written by `export_backup`.
pub const EXPORT_VERSION: u32 = CURRENT_SCHEMA_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEnvelope {
    pub allotment: Value,
    /// Separate variety store written by older exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varieties: Option<Value>,
    pub exported_at: String,
    pub export_version: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub document: Document,
    /// Snapshot of the replaced document, when there was one.
    pub pre_import_key: Option<String>,
    pub migrated_from: Option<u32>,
    /// Varieties taken from a legacy separate store.
    pub merged_varieties: usize,
}

impl<S: KeyValueStore> DocumentStore<S> {
    /// Serializes `document` inside a backup envelope.
    pub fn export_backup(&self, document: &Document) -> StorageResult<String> {
        let allotment = serde_json::to_value(document)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let envelope = BackupEnvelope {
            allotment,
            varieties: None,
            exported_at: self.ctx.timestamp(),
            export_version: EXPORT_VERSION,
        };
        let serialized = serde_json::to_string_pretty(&envelope)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        info!(
            "event=backup_export module=storage status=ok bytes={}",
            serialized.len()
        );
        Ok(serialized)
    }

    /// Replaces the stored document with the one in `raw`.
    ///
    /// # Errors
    /// - `Decode` when `raw` is not JSON.
    /// - `Validation` when the contained document is invalid.
    /// - `CapacityExceeded` when the snapshot or the document does not fit.
    pub fn import_backup(&mut self, raw: &str) -> StorageResult<ImportReport> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| StorageError::Decode(err.to_string()))?;
        let (mut candidate, legacy_varieties) = split_envelope(value);
        let merged_varieties = merge_legacy_varieties(&mut candidate, legacy_varieties);

        let report = validate(&candidate);
        if !report.valid {
            error!(
                "event=backup_import module=storage status=error error_code=invalid_document error_count={}",
                report.errors.len()
            );
            return Err(StorageError::Validation(report.errors));
        }

        let outcome = migrate(candidate, &mut self.ctx)?;
        let migrated_from = (!outcome.is_noop()).then_some(outcome.from_version);
        let document: Document = serde_json::from_value(outcome.document)
            .map_err(|err| StorageError::Incompatible(err.to_string()))?;

        let pre_import_key = self.write_pre_import_snapshot()?;
        let document = self.save(&document)?;

        info!(
            "event=backup_import module=storage status=ok migrated_from={:?} merged_varieties={} snapshot={}",
            migrated_from,
            merged_varieties,
            pre_import_key.is_some()
        );
        Ok(ImportReport {
            document,
            pre_import_key,
            migrated_from,
            merged_varieties,
        })
    }

    fn write_pre_import_snapshot(&mut self) -> StorageResult<Option<String>> {
        let Some(current) = self.kv.get(&self.key)? else {
            return Ok(None);
        };

        let mut timestamp_millis = self.ctx.now().timestamp_millis();
        let mut key = pre_import_key(&self.key, timestamp_millis);
        while self.kv.get(&key)?.is_some() {
            timestamp_millis += 1;
            key = pre_import_key(&self.key, timestamp_millis);
        }

        if let Err(err) = self.kv.set(&key, &current) {
            let bytes = current.len() as u64;
            error!(
                "event=backup_write module=storage status=error kind=pre_import bytes={} error={}",
                bytes, err
            );
            return Err(if is_capacity_exceeded(&err) {
                StorageError::CapacityExceeded {
                    bytes,
                    size: format_bytes(bytes),
                }
            } else {
                StorageError::Backend(err)
            });
        }

        info!(
            "event=backup_write module=storage status=ok kind=pre_import bytes={}",
            current.len()
        );
        Ok(Some(key))
    }
}

/// Separates the document from its envelope; a value without `allotment`
/// is taken as a bare document.
fn split_envelope(value: Value) -> (Value, Option<Vec<Value>>) {
    let mut root = match value {
        Value::Object(root) if root.get("allotment").is_some_and(Value::is_object) => root,
        other => return (other, None),
    };

    let legacy = root
        .remove("varieties")
        .and_then(|store| match store {
            Value::Object(mut store) => store.remove("varieties"),
            Value::Array(items) => Some(Value::Array(items)),
            _ => None,
        })
        .and_then(|items| match items {
            Value::Array(items) => Some(items),
            _ => None,
        });

    let document = root.remove("allotment").unwrap_or(Value::Null);
    (document, legacy)
}

/// Fills an absent or empty `varieties` list from the legacy store.
fn merge_legacy_varieties(document: &mut Value, legacy: Option<Vec<Value>>) -> usize {
    let (Some(root), Some(legacy)) = (document.as_object_mut(), legacy) else {
        return 0;
    };
    if legacy.is_empty() || has_varieties(root) {
        return 0;
    }

    let count = legacy.len();
    root.insert("varieties".to_string(), Value::Array(legacy));
    count
}

fn has_varieties(root: &Map<String, Value>) -> bool {
    match root.get("varieties") {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(store)) => store
            .get("varieties")
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty()),
        _ => false,
    }
}
