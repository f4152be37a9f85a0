//! SQLite-backed key-value provider.
//!
//! # Invariants
//! - Every write is a single upsert statement or one transaction, so SQLite's
//!   journal keeps the previous value intact when a write fails.

use super::{KvStorage, StorageResult};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::cell::RefCell;

const UPSERT_SQL: &str = "INSERT INTO kv_entries (key, value, updated_at)
     VALUES (?1, ?2, strftime('%s', 'now') * 1000)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

/// Key-value provider over a migrated SQLite connection.
pub struct SqliteKvStorage {
    // `Connection::transaction` needs `&mut`, the provider API is `&self`.
    conn: RefCell<Connection>,
}

impl SqliteKvStorage {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: RefCell::new(conn),
        }
    }

    /// Returns the wrapped connection.
    pub fn into_inner(self) -> Connection {
        self.conn.into_inner()
    }
}

impl KvStorage for SqliteKvStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.borrow();
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.conn.borrow();
        if let Err(err) = conn.execute(UPSERT_SQL, params![key, value]) {
            error!(
                "event=kv_set module=storage status=error key={} bytes={} error={}",
                key,
                value.len(),
                err
            );
            return Err(err.into());
        }
        debug!(
            "event=kv_set module=storage status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let conn = self.conn.borrow();
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn set_many(&self, entries: &[(String, String)]) -> StorageResult<()> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            tx.execute(UPSERT_SQL, params![key, value])?;
        }
        tx.commit()?;
        debug!(
            "event=kv_set_many module=storage status=ok entries={}",
            entries.len()
        );
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStorage;
    use crate::db::open_db_in_memory;
    use crate::storage::KvStorage;

    fn storage() -> SqliteKvStorage {
        SqliteKvStorage::new(open_db_in_memory().expect("in-memory db should open"))
    }

    #[test]
    fn set_replaces_previous_value() {
        let kv = storage();
        kv.set("studyhub-notes", "[]").unwrap();
        kv.set("studyhub-notes", "[1]").unwrap();
        assert_eq!(kv.get("studyhub-notes").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let kv = storage();
        kv.remove("missing").unwrap();
        assert_eq!(kv.get("missing").unwrap(), None);
    }

    #[test]
    fn set_many_writes_every_entry() {
        let kv = storage();
        kv.set_many(&[
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ])
        .unwrap();
        assert_eq!(kv.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
