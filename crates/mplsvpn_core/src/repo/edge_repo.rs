//! Provider edge repository contract and SQLite implementation.
//!
//! Provider edges carry no associations and no tenant scope; this is the
//! plain-row end of the store.

use super::accessor::{delete_resource_row, ResourceKind};
use super::{
    ensure_store_ready, parse_uuid, restrict_fields, ProjectionMap, StoreError, StoreResult,
    TableRequirement,
};
use crate::model::edge::{ProviderEdge, ProviderEdgeId};
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::json;

const EDGE_SELECT_SQL: &str = "SELECT
    id,
    name
FROM provider_edges";

const REQUIRED_TABLES: &[TableRequirement] = &[("provider_edges", &["id", "name"])];

impl ProviderEdge {
    /// Renders the caller-facing field map, optionally restricted to `fields`.
    pub fn to_projection(&self, fields: Option<&[&str]>) -> ProjectionMap {
        let mut map = ProjectionMap::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("name".to_string(), json!(self.name));
        restrict_fields(map, fields)
    }
}

/// Query options for listing provider edges.
#[derive(Debug, Clone, Default)]
pub struct ProviderEdgeListQuery {
    pub name: Option<String>,
}

/// Repository interface for provider edge persistence operations.
pub trait ProviderEdgeRepository {
    fn create_provider_edge(&self, edge: &ProviderEdge) -> StoreResult<ProviderEdgeId>;
    fn get_provider_edge(&self, id: ProviderEdgeId) -> StoreResult<ProviderEdge>;
    fn list_provider_edges(&self, query: &ProviderEdgeListQuery)
        -> StoreResult<Vec<ProviderEdge>>;
    fn update_provider_edge_name(&self, id: ProviderEdgeId, name: &str) -> StoreResult<()>;
    fn delete_provider_edge(&self, id: ProviderEdgeId) -> StoreResult<()>;
}

/// SQLite-backed provider edge repository.
#[derive(Debug)]
pub struct SqliteProviderEdgeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProviderEdgeRepository<'conn> {
    /// Fails when the connection has not been migrated to the expected
    /// schema version or lacks the required tables/columns.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ProviderEdgeRepository for SqliteProviderEdgeRepository<'_> {
    fn create_provider_edge(&self, edge: &ProviderEdge) -> StoreResult<ProviderEdgeId> {
        edge.validate()?;

        self.conn.execute(
            "INSERT INTO provider_edges (id, name) VALUES (?1, ?2);",
            params![edge.id.to_string(), edge.name.as_str()],
        )?;

        Ok(edge.id)
    }

    fn get_provider_edge(&self, id: ProviderEdgeId) -> StoreResult<ProviderEdge> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EDGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            return parse_edge_row(row);
        }
        Err(StoreError::ProviderEdgeNotFound(id))
    }

    fn list_provider_edges(
        &self,
        query: &ProviderEdgeListQuery,
    ) -> StoreResult<Vec<ProviderEdge>> {
        let mut sql = format!("{EDGE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = &query.name {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }
        Ok(edges)
    }

    fn update_provider_edge_name(&self, id: ProviderEdgeId, name: &str) -> StoreResult<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyProviderEdgeName.into());
        }

        let changed = self.conn.execute(
            "UPDATE provider_edges SET name = ?1 WHERE id = ?2;",
            params![name, id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::ProviderEdgeNotFound(id));
        }
        Ok(())
    }

    fn delete_provider_edge(&self, id: ProviderEdgeId) -> StoreResult<()> {
        // Circuits keep a plain reference to their edge, so deleting a
        // referenced edge fails at the foreign key.
        delete_resource_row(self.conn, ResourceKind::ProviderEdge, id)
    }
}

fn parse_edge_row(row: &Row<'_>) -> StoreResult<ProviderEdge> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "provider_edges.id")?;

    let edge = ProviderEdge {
        id,
        name: row.get("name")?,
    };
    edge.validate()?;
    Ok(edge)
}
