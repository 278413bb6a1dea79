//! Attachment circuit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, tenant lookup, and network-membership APIs over the
//!   `attachment_circuits` table and its association rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Single-network edits are idempotent (attach an existing pair and detach
//!   a missing pair are no-ops).
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-statement writes run inside a `TxScope`.
//!
//! # See also
//! - docs/releases/v0.1/prs/PR-0004-attachment-circuits.md

use super::accessor::{delete_resource_row, ensure_resource_exists, ResourceKind};
use super::reconcile::{list_child_ids, reconcile_associations, CIRCUIT_NETWORK_ASSOCIATIONS};
use super::{
    ensure_store_ready, parse_uuid, restrict_fields, ProjectionMap, StoreError, StoreResult,
    TableRequirement,
};
use crate::db::TxScope;
use crate::model::circuit::{AttachmentCircuit, AttachmentCircuitId, NetworkType};
use crate::model::edge::ProviderEdgeId;
use crate::model::{NetworkId, ResourceStatus, TenantId};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::json;

const CIRCUIT_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    name,
    network_type,
    provider_edge_id
FROM attachment_circuits";

const REQUIRED_TABLES: &[TableRequirement] = &[
    (
        "attachment_circuits",
        &["id", "tenant_id", "name", "network_type", "provider_edge_id"],
    ),
    (
        "ac_network_associations",
        &["attachmentcircuit_id", "network_id", "status"],
    ),
];

/// One stored circuit row plus its associated network ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentCircuitRecord {
    pub circuit: AttachmentCircuit,
    /// Associated network ids in ascending id order.
    pub networks: Vec<NetworkId>,
}

impl AttachmentCircuitRecord {
    /// Renders the caller-facing field map, optionally restricted to `fields`.
    pub fn to_projection(&self, fields: Option<&[&str]>) -> ProjectionMap {
        let mut map = ProjectionMap::new();
        map.insert("id".to_string(), json!(self.circuit.id));
        map.insert("tenant_id".to_string(), json!(self.circuit.tenant_id));
        map.insert("name".to_string(), json!(self.circuit.name));
        map.insert(
            "network_type".to_string(),
            json!(self.circuit.network_type),
        );
        map.insert(
            "provider_edge_id".to_string(),
            json!(self.circuit.provider_edge_id),
        );
        map.insert("networks".to_string(), json!(self.networks));
        restrict_fields(map, fields)
    }
}

/// Query options for listing attachment circuits.
#[derive(Debug, Clone, Default)]
pub struct AttachmentCircuitListQuery {
    pub tenant_id: Option<TenantId>,
    pub provider_edge_id: Option<ProviderEdgeId>,
}

/// Repository interface for attachment circuit persistence operations.
pub trait AttachmentCircuitRepository {
    /// Inserts the circuit row and populates its network associations
    /// atomically.
    fn create_attachment_circuit(
        &self,
        circuit: &AttachmentCircuit,
        networks: &[NetworkId],
    ) -> StoreResult<AttachmentCircuitId>;
    fn get_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
    ) -> StoreResult<AttachmentCircuitRecord>;
    /// First circuit owned by the tenant, or `None`.
    fn find_attachment_circuit_for_tenant(
        &self,
        tenant_id: &str,
    ) -> StoreResult<Option<AttachmentCircuitRecord>>;
    fn list_attachment_circuits(
        &self,
        query: &AttachmentCircuitListQuery,
    ) -> StoreResult<Vec<AttachmentCircuitRecord>>;
    /// Reconciles the network membership when a list is supplied; an absent
    /// list leaves the membership untouched.
    fn update_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        networks: Option<&[NetworkId]>,
    ) -> StoreResult<()>;
    /// Idempotent single-network attach; returns whether a row was created.
    fn add_network_to_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<bool>;
    /// Idempotent single-network detach; returns whether a row was removed.
    fn remove_network_from_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<bool>;
    fn delete_attachment_circuit(&self, id: AttachmentCircuitId) -> StoreResult<()>;
}

/// SQLite-backed attachment circuit repository.
#[derive(Debug)]
pub struct SqliteAttachmentCircuitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttachmentCircuitRepository<'conn> {
    /// Fails when the connection has not been migrated to the expected
    /// schema version or lacks the required tables/columns.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn load_record(&self, circuit: AttachmentCircuit) -> StoreResult<AttachmentCircuitRecord> {
        let networks = list_child_ids(self.conn, &CIRCUIT_NETWORK_ASSOCIATIONS, circuit.id)?;
        Ok(AttachmentCircuitRecord { circuit, networks })
    }
}

impl AttachmentCircuitRepository for SqliteAttachmentCircuitRepository<'_> {
    fn create_attachment_circuit(
        &self,
        circuit: &AttachmentCircuit,
        networks: &[NetworkId],
    ) -> StoreResult<AttachmentCircuitId> {
        let scope = TxScope::open(self.conn)?;
        self.conn.execute(
            "INSERT INTO attachment_circuits (
                id,
                tenant_id,
                name,
                network_type,
                provider_edge_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                circuit.id.to_string(),
                circuit.tenant_id.as_str(),
                circuit.name.as_str(),
                circuit.network_type.as_str(),
                circuit.provider_edge_id.to_string(),
            ],
        )?;
        reconcile_associations(
            self.conn,
            &CIRCUIT_NETWORK_ASSOCIATIONS,
            circuit.id,
            networks,
        )?;
        scope.commit()?;

        Ok(circuit.id)
    }

    fn get_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
    ) -> StoreResult<AttachmentCircuitRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CIRCUIT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let circuit = parse_circuit_row(row)?;
            return self.load_record(circuit);
        }
        Err(StoreError::AttachmentCircuitNotFound(id))
    }

    fn find_attachment_circuit_for_tenant(
        &self,
        tenant_id: &str,
    ) -> StoreResult<Option<AttachmentCircuitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CIRCUIT_SELECT_SQL} WHERE tenant_id = ?1 ORDER BY id ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([tenant_id])?;

        if let Some(row) = rows.next()? {
            let circuit = parse_circuit_row(row)?;
            return self.load_record(circuit).map(Some);
        }
        Ok(None)
    }

    fn list_attachment_circuits(
        &self,
        query: &AttachmentCircuitListQuery,
    ) -> StoreResult<Vec<AttachmentCircuitRecord>> {
        let mut sql = format!("{CIRCUIT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tenant_id) = &query.tenant_id {
            sql.push_str(" AND tenant_id = ?");
            bind_values.push(Value::Text(tenant_id.clone()));
        }
        if let Some(provider_edge_id) = query.provider_edge_id {
            sql.push_str(" AND provider_edge_id = ?");
            bind_values.push(Value::Text(provider_edge_id.to_string()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut circuits = Vec::new();
        while let Some(row) = rows.next()? {
            circuits.push(parse_circuit_row(row)?);
        }

        let mut records = Vec::with_capacity(circuits.len());
        for circuit in circuits {
            records.push(self.load_record(circuit)?);
        }
        Ok(records)
    }

    fn update_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        networks: Option<&[NetworkId]>,
    ) -> StoreResult<()> {
        let scope = TxScope::open(self.conn)?;
        ensure_resource_exists(self.conn, ResourceKind::AttachmentCircuit, id)?;

        if let Some(networks) = networks {
            reconcile_associations(self.conn, &CIRCUIT_NETWORK_ASSOCIATIONS, id, networks)?;
        }
        scope.commit()?;
        Ok(())
    }

    fn add_network_to_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<bool> {
        let scope = TxScope::open(self.conn)?;
        ensure_resource_exists(self.conn, ResourceKind::AttachmentCircuit, id)?;

        // OR IGNORE absorbs the duplicate-pair case only; a nonexistent
        // network still fails at the foreign key.
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO ac_network_associations (
                attachmentcircuit_id,
                network_id,
                status
            ) VALUES (?1, ?2, ?3);",
            params![
                id.to_string(),
                network_id.to_string(),
                ResourceStatus::Active.as_str(),
            ],
        )?;
        scope.commit()?;

        if changed > 0 {
            debug!(
                "event=network_attach module=repo status=ok attachmentcircuit_id={id} network_id={network_id}"
            );
        }
        Ok(changed > 0)
    }

    fn remove_network_from_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<bool> {
        let scope = TxScope::open(self.conn)?;
        ensure_resource_exists(self.conn, ResourceKind::AttachmentCircuit, id)?;

        let changed = self.conn.execute(
            "DELETE FROM ac_network_associations
             WHERE attachmentcircuit_id = ?1 AND network_id = ?2;",
            params![id.to_string(), network_id.to_string()],
        )?;
        scope.commit()?;

        if changed > 0 {
            debug!(
                "event=network_detach module=repo status=ok attachmentcircuit_id={id} network_id={network_id}"
            );
        }
        Ok(changed > 0)
    }

    fn delete_attachment_circuit(&self, id: AttachmentCircuitId) -> StoreResult<()> {
        delete_resource_row(self.conn, ResourceKind::AttachmentCircuit, id)
    }
}

fn parse_circuit_row(row: &Row<'_>) -> StoreResult<AttachmentCircuit> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "attachment_circuits.id")?;

    let network_type_text: String = row.get("network_type")?;
    let network_type = NetworkType::parse(&network_type_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid network type `{network_type_text}` in attachment_circuits.network_type"
        ))
    })?;

    let provider_edge_text: String = row.get("provider_edge_id")?;
    let provider_edge_id = parse_uuid(&provider_edge_text, "attachment_circuits.provider_edge_id")?;

    Ok(AttachmentCircuit {
        id,
        tenant_id: row.get("tenant_id")?,
        name: row.get("name")?,
        network_type,
        provider_edge_id,
    })
}
