//! SQLite file that backs the StudyHub key-value store.
//!
//! The whole schema is one table, `kv_entries`: a text `key` naming a
//! collection (`studyhub-notes`, `studyhub-semesters`, ...), the collection's
//! JSON text in `value`, and an `updated_at` stamp in epoch milliseconds.
//! Collections are never split across rows, so a schema change only ever
//! touches this table and its indexes.
//!
//! # Invariants
//! - The schema revision lives in `PRAGMA user_version`; 0 means a blank file.
//! - A file written by a newer build is refused rather than downgraded.
//! - `kv_entries` exists on every connection handed to the storage layer.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A schema step failed; the file keeps its previous revision.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was last written by a build with a newer schema.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Migration { version, source } => {
                write!(f, "schema step {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "data file uses schema {db_version}, this build understands up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
