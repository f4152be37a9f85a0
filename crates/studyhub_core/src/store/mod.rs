//! Persistent collection store.
//!
//! # Responsibility
//! - Load named collections from a durable provider with fail-soft parsing.
//! - Route every change through `mutate`, which writes the whole value back.
//! - Issue record identifiers unique within their collection.
//!
//! # Invariants
//! - A missing or malformed stored value reads as the caller's default and is
//!   never written back until a mutation happens.
//! - A failed write leaves both the in-memory and the durable value at their
//!   previous state.
//! - Every mutation re-serializes the whole collection; collections are
//!   expected to hold hundreds of records, not millions.

use crate::storage::{KvStorage, StorageError};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod collection;
mod persisted;

pub use collection::{add_record, remove_record, update_record, Collection, ListQuery};
pub use persisted::PersistedValue;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure while reading or writing a collection.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    /// The in-memory value could not be serialized for write-back.
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialize { key, source } => {
                write!(f, "failed to serialize collection `{key}`: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Serialize { source, .. } => Some(source),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Named collections persisted by StudyHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKey {
    Notes,
    Semesters,
    Expenses,
    SavingsGoals,
    SpendingLimits,
    Events,
    Flashcards,
    Quiz,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 8] = [
        CollectionKey::Notes,
        CollectionKey::Semesters,
        CollectionKey::Expenses,
        CollectionKey::SavingsGoals,
        CollectionKey::SpendingLimits,
        CollectionKey::Events,
        CollectionKey::Flashcards,
        CollectionKey::Quiz,
    ];

    /// Durable storage key, shared with exported backup bundles.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Notes => "studyhub-notes",
            Self::Semesters => "studyhub-semesters",
            Self::Expenses => "studyhub-expenses",
            Self::SavingsGoals => "studyhub-savings-goals",
            Self::SpendingLimits => "studyhub-spending-limits",
            Self::Events => "studyhub-events",
            Self::Flashcards => "studyhub-flashcards",
            Self::Quiz => "studyhub-quiz",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.storage_key() == key)
    }
}

/// A record addressable by id inside an ordered list.
pub trait Record: Clone {
    /// Shallow-merge change set applied by replace-by-id updates.
    type Patch;

    fn id(&self) -> &str;

    /// Merges `patch` into this record. Invalid patch values are ignored.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Re-establishes record invariants; runs on every write path.
    fn normalize(&mut self) {}

    /// Reports values that `normalize` cannot repair, such as a non-positive
    /// weight. Records arriving from outside the services are checked with it.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Refreshes modification timestamps after a content-affecting update.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

/// A record stored as its own top-level collection.
pub trait CollectionRecord: Record + Serialize + DeserializeOwned {
    const KEY: CollectionKey;
}

/// Process-wide entry point to durable collections.
///
/// Constructed once per process around a provider and passed by reference to
/// services; it holds no collection state of its own.
pub struct Store<S: KvStorage> {
    storage: S,
}

impl<S: KvStorage> Store<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Reads `key`, falling back to `default` when the key is absent or its
    /// value does not parse as `T`. Nothing is written on fallback.
    ///
    /// # Errors
    /// - Returns `StoreError::Storage` when the provider itself fails to read.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> StoreResult<T> {
        let Some(raw) = self.storage.get(key)? else {
            debug!("event=collection_load module=store status=default key={key} reason=absent");
            return Ok(default);
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!(
                    "event=collection_load module=store status=ok key={key} bytes={}",
                    raw.len()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event=collection_load module=store status=fallback key={key} reason=malformed line={} column={}",
                    err.line(),
                    err.column()
                );
                Ok(default)
            }
        }
    }

    /// Serializes `value` and replaces the stored value under `key`.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let serialized = serialize(key, value)?;
        self.storage.set(key, &serialized)?;
        Ok(())
    }

    /// Removes `key` from durable storage.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.storage.remove(key)?;
        Ok(())
    }

    /// Opens a persisted value for `key`, loaded with [`Store::load`].
    pub fn persisted<T>(&self, key: &'static str, default: T) -> StoreResult<PersistedValue<'_, S, T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let value = self.load(key, default)?;
        Ok(PersistedValue::new(self, key, value))
    }

    /// Opens the top-level collection of `R`.
    pub fn collection<R: CollectionRecord>(&self) -> StoreResult<Collection<'_, S, R>> {
        Ok(Collection::new(self.persisted(R::KEY.storage_key(), Vec::new())?))
    }

    /// Issues a fresh UUID v4 string that `is_taken` does not report as used.
    pub fn issue_id(&self, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = Uuid::new_v4().to_string();
            if !is_taken(&candidate) {
                return candidate;
            }
            warn!("event=issue_id module=store status=retry reason=collision");
        }
    }
}

pub(crate) fn serialize<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })
}
