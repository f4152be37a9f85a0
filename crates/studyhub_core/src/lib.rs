//! Core domain logic for StudyHub.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod gpa;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use service::{
    AcademicService, BackupError, BackupService, CalendarService, FinanceService, NoteService,
    StudyService,
};
pub use storage::{KvStorage, MemoryKvStorage, SqliteKvStorage, StorageError};
pub use store::{CollectionKey, Store, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
