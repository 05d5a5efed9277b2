use aptgrid_core::db::migrations::latest_version;
use aptgrid_core::db::{open_db, open_db_in_memory, DbError};
use aptgrid_core::{SessionStorage, SqliteSessionStorage, StorageError};
use rusqlite::Connection;

#[test]
fn in_memory_database_gets_session_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "session_state");
}

#[test]
fn reopening_a_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aptgrid_session.sqlite3");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "session_state");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        SqliteSessionStorage::open(&path, "s1"),
        Err(StorageError::Db(DbError::UnsupportedSchemaVersion { .. }))
    ));
}

#[test]
fn stale_session_rows_are_purged_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aptgrid_session.sqlite3");

    {
        let mut storage = SqliteSessionStorage::open(&path, "old").unwrap();
        storage.set("selectedTab", "list").unwrap();
    }
    {
        let conn = open_db(&path).unwrap();
        conn.execute("UPDATE session_state SET updated_at = 0;", [])
            .unwrap();
    }

    let storage = SqliteSessionStorage::open(&path, "old").unwrap();
    assert_eq!(storage.get("selectedTab").unwrap(), None);
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
