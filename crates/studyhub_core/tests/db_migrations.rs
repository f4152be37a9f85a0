use rusqlite::Connection;
use studyhub_core::db::migrations::{apply_migrations, latest_version, schema_version as stored_schema_version};
use studyhub_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studyhub.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO kv_entries(key, value) VALUES ('studyhub-notes', '[]');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let stored: String = conn_second
        .query_row(
            "SELECT value FROM kv_entries WHERE key = 'studyhub-notes';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "[]");
}

#[test]
fn blank_connection_moves_from_revision_zero_to_latest() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), 0);

    apply_migrations(&mut conn).unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "kv_entries");

    // Re-running on an up-to-date file is a no-op.
    apply_migrations(&mut conn).unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), latest_version());
}

#[test]
fn kv_entries_stamps_updated_at_by_default() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO kv_entries(key, value) VALUES ('studyhub-events', '[]');",
        [],
    )
    .unwrap();
    let updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM kv_entries WHERE key = 'studyhub-events';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(updated_at > 0);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
