//! In-memory key-value provider.
//!
//! Used as the test fake for the collection store and for throwaway sessions.

use super::{KvStorage, StorageError, StorageResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Process-local provider backed by a sorted map.
#[derive(Debug, Default)]
pub struct MemoryKvStorage {
    entries: RefCell<BTreeMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryKvStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with [`StorageError::WriteRejected`],
    /// mimicking an exhausted storage quota.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Returns the raw stored string for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn check_writable(&self, key: &str) -> StorageResult<()> {
        if self.reject_writes.get() {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }
}

impl KvStorage for MemoryKvStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(String, String)]) -> StorageResult<()> {
        if let Some((key, _)) = entries.first() {
            self.check_writable(key)?;
        }
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}
