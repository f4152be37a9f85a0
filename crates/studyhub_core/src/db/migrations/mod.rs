//! Ordered schema steps for the key-value file.
//!
//! Each step is a numbered `.sql` file next to this module. A blank file runs
//! every step; an existing file runs only the steps above its stored
//! revision, all inside one transaction so a failure leaves the old revision
//! in place.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(revision, sql)` pairs in ascending revision order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_kv_entries.sql"))];

/// Highest schema revision this build can write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Revision currently recorded in the file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is ahead of this build.
/// - `Migration` naming the step that failed; nothing is committed then.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration {
                version: *version,
                source,
            })?;
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok from={found} to={latest}");
    Ok(())
}
