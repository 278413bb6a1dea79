use mplsvpn_core::db::migrations::latest_version;
use mplsvpn_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "provider_edges");
    assert_table_exists(&conn, "networks");
    assert_table_exists(&conn, "attachment_circuits");
    assert_table_exists(&conn, "ac_network_associations");
    assert_table_exists(&conn, "mplsvpns");
    assert_table_exists(&conn, "ac_mplsvpn_associations");
}

#[test]
fn open_db_enforces_foreign_keys() {
    let conn = open_db_in_memory().unwrap();

    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mplsvpn.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "mplsvpns");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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

#[test]
fn enum_columns_reject_unknown_spellings() {
    let conn = open_db_in_memory().unwrap();

    let err = conn
        .execute(
            "INSERT INTO mplsvpns (
                id, tenant_id, name, status, vpn_id,
                tunnel_type, tunnel_backup, qos, bandwidth
            ) VALUES ('v1', 't1', 'vpn', 'ACTIVE', '', 'FULLMESH', 'frr', 'Gold', 10);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"), "got: {err}");
}

#[test]
fn bandwidth_column_rejects_non_positive_values() {
    let conn = open_db_in_memory().unwrap();

    let err = conn
        .execute(
            "INSERT INTO mplsvpns (
                id, tenant_id, name, status, vpn_id,
                tunnel_type, tunnel_backup, qos, bandwidth
            ) VALUES ('v1', 't1', 'vpn', 'ACTIVE', '', 'fullmesh', 'frr', 'Gold', 0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"), "got: {err}");
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
