//! Backup bundle export and import.
//!
//! # Responsibility
//! - Export the user-facing collections as one versioned JSON object keyed by
//!   storage key.
//! - Import a bundle only after every known key has been validated and
//!   normalized, then write all keys in one atomic step.
//!
//! # Invariants
//! - A rejected import writes nothing.
//! - Imported records are stored in normalized form; values `normalize`
//!   cannot repair (non-positive credit hours or amounts) reject the bundle.
//! - Bundles without a `version` field are legacy bundles and are accepted.
//! - Open services keep their loaded collections; reopen them after import.

use crate::model::academic::Semester;
use crate::model::calendar::CalendarEvent;
use crate::model::finance::{Expense, SavingsGoal, SpendingLimit};
use crate::model::note::Note;
use crate::model::study::{Flashcard, QuizQuestion};
use crate::storage::KvStorage;
use crate::store::{serialize, CollectionKey, Record, Store, StoreError};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Bundle format written by [`BackupService::export_bundle`].
pub const BACKUP_FORMAT_VERSION: u64 = 1;

/// Collections included in exported bundles.
pub const EXPORTED_COLLECTIONS: [CollectionKey; 6] = [
    CollectionKey::Notes,
    CollectionKey::Semesters,
    CollectionKey::Expenses,
    CollectionKey::SavingsGoals,
    CollectionKey::Events,
    CollectionKey::Flashcards,
];

const VERSION_FIELD: &str = "version";
const EXPORTED_AT_FIELD: &str = "exportedAt";

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug)]
pub enum BackupError {
    /// Input is not JSON at all.
    InvalidJson(serde_json::Error),
    /// Input is JSON but not a bundle, or a collection fails its schema.
    WrongShape { key: Option<String>, reason: String },
    UnsupportedVersion { found: u64, supported: u64 },
    Store(StoreError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "invalid backup file: {err}"),
            Self::WrongShape { key: Some(key), reason } => {
                write!(f, "invalid backup file: `{key}` {reason}")
            }
            Self::WrongShape { key: None, reason } => write!(f, "invalid backup file: {reason}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "backup version {found} is newer than supported version {supported}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::WrongShape { .. } | Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<StoreError> for BackupError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Keys written and skipped by one import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct BackupService<'s, S: KvStorage> {
    store: &'s Store<S>,
}

impl<'s, S: KvStorage> BackupService<'s, S> {
    pub fn new(store: &'s Store<S>) -> Self {
        Self { store }
    }

    /// Serializes the exported collections into a pretty-printed bundle.
    ///
    /// Collections absent from storage are omitted.
    pub fn export_bundle(&self, exported_at: DateTime<Utc>) -> BackupResult<String> {
        let mut bundle = Map::new();
        bundle.insert(VERSION_FIELD.to_string(), Value::from(BACKUP_FORMAT_VERSION));
        bundle.insert(
            EXPORTED_AT_FIELD.to_string(),
            Value::from(exported_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let mut collections = 0usize;
        for key in EXPORTED_COLLECTIONS {
            let storage_key = key.storage_key();
            if let Some(value) = self.store.load::<Option<Value>>(storage_key, None)? {
                bundle.insert(storage_key.to_string(), value);
                collections += 1;
            }
        }

        let rendered = serde_json::to_string_pretty(&Value::Object(bundle)).map_err(|source| {
            BackupError::Store(StoreError::Serialize {
                key: "backup".to_string(),
                source,
            })
        })?;
        info!(
            "event=backup_export module=service status=ok collections={collections} bytes={}",
            rendered.len()
        );
        Ok(rendered)
    }

    /// Validates `raw` and replaces every collection it carries.
    ///
    /// # Errors
    /// - `InvalidJson` / `WrongShape` when the bundle cannot be read.
    /// - `UnsupportedVersion` when the bundle is newer than this build.
    /// - `Store` when the atomic write fails.
    pub fn import_bundle(&self, raw: &str) -> BackupResult<ImportReport> {
        let entries = parse_bundle(raw).inspect_err(|err| {
            warn!("event=backup_import module=service status=error reason={err}");
        })?;

        let mut report = ImportReport::default();
        let mut writes = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match CollectionKey::from_storage_key(&key) {
                Some(collection) => {
                    let records = prepare_collection(collection, &value).map_err(|reason| {
                        BackupError::WrongShape {
                            key: Some(key.clone()),
                            reason,
                        }
                    })?;
                    writes.push((key.clone(), serialize(&key, &records)?));
                    report.written.push(key);
                }
                None => {
                    warn!("event=backup_import module=service status=skip key={key} reason=unknown_key");
                    report.skipped.push(key);
                }
            }
        }

        self.store
            .storage()
            .set_many(&writes)
            .map_err(StoreError::from)?;
        info!(
            "event=backup_import module=service status=ok written={} skipped={}",
            report.written.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Removes every StudyHub collection from durable storage.
    pub fn clear_all(&self) -> BackupResult<()> {
        for key in CollectionKey::ALL {
            self.store.remove(key.storage_key())?;
        }
        info!(
            "event=clear_all module=service status=ok collections={}",
            CollectionKey::ALL.len()
        );
        Ok(())
    }
}

/// Suggested file name for a bundle exported on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("studyhub-backup-{}.json", date.format("%Y-%m-%d"))
}

fn parse_bundle(raw: &str) -> BackupResult<Vec<(String, Value)>> {
    let parsed: Value = serde_json::from_str(raw).map_err(BackupError::InvalidJson)?;
    let Value::Object(mut bundle) = parsed else {
        return Err(BackupError::WrongShape {
            key: None,
            reason: "expected a JSON object".to_string(),
        });
    };

    if let Some(version) = bundle.remove(VERSION_FIELD) {
        let Some(found) = version.as_u64() else {
            return Err(BackupError::WrongShape {
                key: Some(VERSION_FIELD.to_string()),
                reason: "must be a non-negative integer".to_string(),
            });
        };
        if found > BACKUP_FORMAT_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found,
                supported: BACKUP_FORMAT_VERSION,
            });
        }
    }
    bundle.remove(EXPORTED_AT_FIELD);

    Ok(bundle.into_iter().collect())
}

/// Reads `value` as the typed collection for `key` and returns it in the
/// normalized form that gets stored.
fn prepare_collection(key: CollectionKey, value: &Value) -> Result<Value, String> {
    match key {
        CollectionKey::Notes => prepare_as::<Note>(value),
        CollectionKey::Semesters => prepare_as::<Semester>(value),
        CollectionKey::Expenses => prepare_as::<Expense>(value),
        CollectionKey::SavingsGoals => prepare_as::<SavingsGoal>(value),
        CollectionKey::SpendingLimits => prepare_as::<SpendingLimit>(value),
        CollectionKey::Events => prepare_as::<CalendarEvent>(value),
        CollectionKey::Flashcards => prepare_as::<Flashcard>(value),
        CollectionKey::Quiz => prepare_as::<QuizQuestion>(value),
    }
}

fn prepare_as<R>(value: &Value) -> Result<Value, String>
where
    R: Record + Serialize + DeserializeOwned,
{
    let mut records = Vec::<R>::deserialize(value).map_err(|err| err.to_string())?;
    for record in &mut records {
        record.validate()?;
        record.normalize();
    }
    serde_json::to_value(&records).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, parse_bundle, prepare_collection, BackupError};
    use crate::store::CollectionKey;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(backup_file_name(date), "studyhub-backup-2024-03-07.json");
    }

    #[test]
    fn metadata_fields_are_not_collections() {
        let entries =
            parse_bundle(r#"{"version":1,"exportedAt":"2024-01-01T00:00:00.000Z","studyhub-notes":[]}"#)
                .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "studyhub-notes");
    }

    #[test]
    fn rejects_non_object_and_newer_versions() {
        assert!(matches!(
            parse_bundle("[1, 2]"),
            Err(BackupError::WrongShape { key: None, .. })
        ));
        assert!(matches!(
            parse_bundle(r#"{"version": 2}"#),
            Err(BackupError::UnsupportedVersion { found: 2, supported: 1 })
        ));
        assert!(matches!(parse_bundle("not json"), Err(BackupError::InvalidJson(_))));
    }

    #[test]
    fn prepared_goals_are_clamped_and_bad_amounts_rejected() {
        let goals = json!([
            {"id": "g1", "name": "Bike", "targetAmount": 100.0, "currentAmount": 500.0}
        ]);
        let prepared = prepare_collection(CollectionKey::SavingsGoals, &goals).unwrap();
        assert_eq!(prepared[0]["currentAmount"], 100.0);

        let expenses = json!([
            {"id": "e1", "amount": -4.0, "category": "food", "date": "2024-05-01"}
        ]);
        let reason = prepare_collection(CollectionKey::Expenses, &expenses).unwrap_err();
        assert!(reason.contains("amount"));
    }
}
