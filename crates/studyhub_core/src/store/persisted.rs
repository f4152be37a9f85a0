//! In-memory view of one durable key.

use super::{serialize, Store, StoreResult};
use crate::storage::KvStorage;
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

/// Current value of one key plus the sole sanctioned way to change it.
pub struct PersistedValue<'s, S: KvStorage, T> {
    store: &'s Store<S>,
    key: &'static str,
    value: T,
}

impl<'s, S, T> PersistedValue<'s, S, T>
where
    S: KvStorage,
    T: Serialize + DeserializeOwned + Clone,
{
    pub(crate) fn new(store: &'s Store<S>, key: &'static str, value: T) -> Self {
        Self { store, key, value }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub(crate) fn store(&self) -> &'s Store<S> {
        self.store
    }

    /// Applies `transform` to a copy of the current value, writes the result
    /// to durable storage, then adopts it in memory.
    ///
    /// # Errors
    /// - Serialization or provider failures; the previous value stays current
    ///   both in memory and in storage.
    pub fn mutate(&mut self, transform: impl FnOnce(T) -> T) -> StoreResult<&T> {
        let started_at = Instant::now();
        let next = transform(self.value.clone());
        let serialized = serialize(self.key, &next)?;

        if let Err(err) = self.store.storage().set(self.key, &serialized) {
            error!(
                "event=collection_mutate module=store status=error key={} duration_ms={} error={}",
                self.key,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        debug!(
            "event=collection_mutate module=store status=ok key={} bytes={} duration_ms={}",
            self.key,
            serialized.len(),
            started_at.elapsed().as_millis()
        );
        self.value = next;
        Ok(&self.value)
    }
}
