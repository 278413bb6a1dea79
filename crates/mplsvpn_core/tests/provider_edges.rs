use mplsvpn_core::db::migrations::latest_version;
use mplsvpn_core::db::open_db_in_memory;
use mplsvpn_core::{
    CreateProviderEdgeRequest, ProviderEdge, ProviderEdgeListQuery, ProviderEdgeRepository,
    ProviderEdgeService, SqliteProviderEdgeRepository, StoreError, UpdateProviderEdgeRequest,
    ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_and_get_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    let edge = ProviderEdge::new("pe-east-1");
    let id = repo.create_provider_edge(&edge).unwrap();
    assert_eq!(id, edge.id);

    let loaded = repo.get_provider_edge(id).unwrap();
    assert_eq!(loaded, edge);
}

#[test]
fn blank_name_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    let err = repo
        .create_provider_edge(&ProviderEdge::new("   "))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyProviderEdgeName)
    ));

    let edges = repo
        .list_provider_edges(&ProviderEdgeListQuery::default())
        .unwrap();
    assert!(edges.is_empty());
}

#[test]
fn get_missing_edge_returns_typed_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo.get_provider_edge(missing).unwrap_err();
    assert!(matches!(err, StoreError::ProviderEdgeNotFound(id) if id == missing));
}

#[test]
fn list_filters_by_exact_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    repo.create_provider_edge(&ProviderEdge::new("pe-east-1"))
        .unwrap();
    repo.create_provider_edge(&ProviderEdge::new("pe-west-1"))
        .unwrap();

    let all = repo
        .list_provider_edges(&ProviderEdgeListQuery::default())
        .unwrap();
    assert_eq!(all.len(), 2);

    let query = ProviderEdgeListQuery {
        name: Some("pe-west-1".to_string()),
    };
    let filtered = repo.list_provider_edges(&query).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "pe-west-1");
}

#[test]
fn service_create_reads_back_persisted_record() {
    let conn = open_db_in_memory().unwrap();
    let service = edge_service(&conn);

    let edge = service
        .create_provider_edge(CreateProviderEdgeRequest {
            name: "pe-east-1".to_string(),
        })
        .unwrap();
    assert_eq!(edge.name, "pe-east-1");

    let projection = service.get_provider_edge(edge.id, None).unwrap();
    assert_eq!(
        projection.get("name").and_then(|value| value.as_str()),
        Some("pe-east-1")
    );
    assert_eq!(
        projection.get("id").and_then(|value| value.as_str()),
        Some(edge.id.to_string().as_str())
    );
}

#[test]
fn service_update_replaces_name() {
    let conn = open_db_in_memory().unwrap();
    let service = edge_service(&conn);

    let edge = service
        .create_provider_edge(CreateProviderEdgeRequest {
            name: "pe-east-1".to_string(),
        })
        .unwrap();

    let updated = service
        .update_provider_edge(
            edge.id,
            UpdateProviderEdgeRequest {
                name: "pe-east-2".to_string(),
            },
        )
        .unwrap();
    assert_eq!(updated.name, "pe-east-2");

    let err = service
        .update_provider_edge(
            edge.id,
            UpdateProviderEdgeRequest {
                name: "  ".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyProviderEdgeName)
    ));
}

#[test]
fn projection_restricts_to_requested_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = edge_service(&conn);

    let edge = service
        .create_provider_edge(CreateProviderEdgeRequest {
            name: "pe-east-1".to_string(),
        })
        .unwrap();

    let projection = service
        .get_provider_edge(edge.id, Some(&["name", "no_such_field"]))
        .unwrap();
    assert_eq!(projection.len(), 1);
    assert!(projection.contains_key("name"));
    assert!(!projection.contains_key("id"));
}

#[test]
fn delete_missing_edge_returns_typed_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo.delete_provider_edge(missing).unwrap_err();
    assert!(matches!(err, StoreError::ProviderEdgeNotFound(id) if id == missing));
}

#[test]
fn deleting_referenced_edge_fails_at_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProviderEdgeRepository::try_new(&conn).unwrap();

    let edge = ProviderEdge::new("pe-east-1");
    repo.create_provider_edge(&edge).unwrap();
    seed_circuit_on_edge(&conn, edge.id);

    let err = repo.delete_provider_edge(edge.id).unwrap_err();
    assert!(err.is_constraint_violation(), "got: {err}");

    // The edge must survive the failed delete.
    assert!(repo.get_provider_edge(edge.id).is_ok());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteProviderEdgeRepository::try_new(&conn).unwrap_err();
    match err {
        StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let err = SqliteProviderEdgeRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        StoreError::MissingRequiredTable("provider_edges")
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE provider_edges (id TEXT PRIMARY KEY NOT NULL);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    let err = SqliteProviderEdgeRepository::try_new(&conn).unwrap_err();
    match err {
        StoreError::MissingRequiredColumn { table, column } => {
            assert_eq!(table, "provider_edges");
            assert_eq!(column, "name");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn edge_service(conn: &Connection) -> ProviderEdgeService<SqliteProviderEdgeRepository<'_>> {
    ProviderEdgeService::new(SqliteProviderEdgeRepository::try_new(conn).unwrap())
}

fn seed_circuit_on_edge(conn: &Connection, edge_id: Uuid) {
    conn.execute(
        "INSERT INTO attachment_circuits (id, tenant_id, name, network_type, provider_edge_id)
         VALUES (?1, 'tenant-a', 'ac-1', 'L3', ?2);",
        [Uuid::new_v4().to_string(), edge_id.to_string()],
    )
    .unwrap();
}
