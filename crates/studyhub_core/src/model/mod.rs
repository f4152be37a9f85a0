//! Domain model for StudyHub collections.
//!
//! # Responsibility
//! - Define the records stored in each named collection.
//! - Define shallow-merge patches used by replace-by-id updates.
//! - Enforce per-record invariants through `Record::normalize`.
//!
//! # Invariants
//! - Serialized field names follow the camelCase layout of exported backups.
//! - Every record is identified by a `RecordId` unique within its collection.

pub mod academic;
pub mod calendar;
pub mod finance;
pub mod note;
pub mod study;

/// Identifier of one record inside its collection.
///
/// Kept as a string so identifiers from imported backups are preserved as-is.
pub type RecordId = String;
