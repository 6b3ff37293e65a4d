//! In-memory key-value store with an optional byte quota.

use super::{KeyValueStore, KvError, KvResult};
use std::collections::BTreeMap;

/// Error name browsers raise when a write exceeds the origin quota.
const QUOTA_ERROR_CODE: &str = "QuotaExceededError";

/// Volatile store used by tests and embedding hosts without a disk.
///
/// With a quota set, usage is counted as the UTF-8 length of every key plus
/// its value; a write that would exceed the quota fails and stores nothing.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<u64>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn set_quota(&mut self, quota_bytes: Option<u64>) {
        self.quota_bytes = quota_bytes;
    }

    /// Bytes currently used by all entries.
    pub fn used_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(key, value)| entry_size(key, value))
            .sum()
    }

    fn used_bytes_without(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(key, value)| entry_size(key, value))
            .sum()
    }
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        if let Some(quota) = self.quota_bytes {
            let projected = self.used_bytes_without(key) + entry_size(key, value);
            if projected > quota {
                return Err(KvError::new(
                    Some(QUOTA_ERROR_CODE),
                    format!("setting `{key}` needs {projected} bytes, quota is {quota}"),
                ));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn capacity_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }
}
