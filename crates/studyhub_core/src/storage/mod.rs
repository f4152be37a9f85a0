//! Durable key-value storage providers.
//!
//! # Responsibility
//! - Define the synchronous provider contract consumed by the collection store.
//! - Ship a SQLite-backed provider and an in-memory fake.
//!
//! # Invariants
//! - `set` replaces the whole value for one key or leaves the previous value
//!   untouched; it never leaves a partially written value behind.
//! - `set_many` applies every entry or none of them.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory_kv;
mod sqlite_kv;

pub use memory_kv::MemoryKvStorage;
pub use sqlite_kv::SqliteKvStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Provider-level failure for durable reads and writes.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// The provider refused the write (quota exceeded, storage disabled).
    WriteRejected { key: String, reason: String },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::WriteRejected { key, reason } => {
                write!(f, "write rejected for key `{key}`: {reason}")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::WriteRejected { .. } => None,
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

/// Synchronous key-value provider holding one serialized string per key.
pub trait KvStorage {
    /// Returns the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
    /// Replaces several keys in one all-or-nothing step.
    fn set_many(&self, entries: &[(String, String)]) -> StorageResult<()>;
    /// Lists stored keys in ascending order.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

impl<T: KvStorage + ?Sized> KvStorage for &T {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn set_many(&self, entries: &[(String, String)]) -> StorageResult<()> {
        (**self).set_many(entries)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}
