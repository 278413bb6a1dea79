//! MPLS-VPN repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, tenant lookup, and circuit-membership APIs over the
//!   `mplsvpns` table and its association rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `MplsVpn::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-statement writes run inside a `TxScope`.
//!
//! # See also
//! - docs/releases/v0.1/prs/PR-0005-mplsvpn-crud.md

use super::accessor::{delete_resource_row, ensure_resource_exists, ResourceKind};
use super::reconcile::{list_child_ids, reconcile_associations, VPN_CIRCUIT_ASSOCIATIONS};
use super::{
    ensure_store_ready, parse_uuid, restrict_fields, ProjectionMap, StoreError, StoreResult,
    TableRequirement,
};
use crate::db::TxScope;
use crate::model::circuit::AttachmentCircuitId;
use crate::model::vpn::{MplsVpn, MplsVpnId, Qos, TunnelBackup, TunnelOptions, TunnelType};
use crate::model::{ResourceStatus, TenantId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::json;

const MPLSVPN_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    name,
    status,
    vpn_id,
    tunnel_type,
    tunnel_backup,
    qos,
    bandwidth
FROM mplsvpns";

const REQUIRED_TABLES: &[TableRequirement] = &[
    (
        "mplsvpns",
        &[
            "id",
            "tenant_id",
            "name",
            "status",
            "vpn_id",
            "tunnel_type",
            "tunnel_backup",
            "qos",
            "bandwidth",
        ],
    ),
    (
        "ac_mplsvpn_associations",
        &["mplsvpn_id", "attachmentcircuit_id", "status"],
    ),
];

/// One stored VPN row plus its associated attachment circuit ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MplsVpnRecord {
    pub vpn: MplsVpn,
    /// Associated circuit ids in ascending id order.
    pub attachment_circuits: Vec<AttachmentCircuitId>,
}

impl MplsVpnRecord {
    /// Renders the caller-facing field map, optionally restricted to `fields`.
    pub fn to_projection(&self, fields: Option<&[&str]>) -> ProjectionMap {
        let mut map = ProjectionMap::new();
        map.insert("id".to_string(), json!(self.vpn.id));
        map.insert("tenant_id".to_string(), json!(self.vpn.tenant_id));
        map.insert("name".to_string(), json!(self.vpn.name));
        map.insert("vpn_id".to_string(), json!(self.vpn.vpn_id));
        map.insert(
            "tunnel_options".to_string(),
            json!(self.vpn.tunnel_options),
        );
        map.insert("status".to_string(), json!(self.vpn.status));
        map.insert(
            "attachment_circuits".to_string(),
            json!(self.attachment_circuits),
        );
        restrict_fields(map, fields)
    }
}

/// Query options for listing VPN instances.
#[derive(Debug, Clone, Default)]
pub struct MplsVpnListQuery {
    pub tenant_id: Option<TenantId>,
    pub status: Option<ResourceStatus>,
}

/// Repository interface for MPLS-VPN persistence operations.
pub trait MplsVpnRepository {
    /// Inserts the VPN row and populates its circuit associations atomically.
    fn create_mplsvpn(
        &self,
        vpn: &MplsVpn,
        attachment_circuits: &[AttachmentCircuitId],
    ) -> StoreResult<MplsVpnId>;
    fn get_mplsvpn(&self, id: MplsVpnId) -> StoreResult<MplsVpnRecord>;
    /// First VPN owned by the tenant, or `None`.
    fn find_mplsvpn_for_tenant(&self, tenant_id: &str) -> StoreResult<Option<MplsVpnRecord>>;
    /// The VPN whose association set contains the circuit, if any.
    fn find_mplsvpn_for_attachment_circuit(
        &self,
        attachmentcircuit_id: AttachmentCircuitId,
    ) -> StoreResult<Option<MplsVpnRecord>>;
    fn list_mplsvpns(&self, query: &MplsVpnListQuery) -> StoreResult<Vec<MplsVpnRecord>>;
    /// Reconciles the circuit membership when a list is supplied; an absent
    /// list leaves the membership untouched.
    fn update_mplsvpn(
        &self,
        id: MplsVpnId,
        attachment_circuits: Option<&[AttachmentCircuitId]>,
    ) -> StoreResult<()>;
    /// Lifecycle-driver path: pushes a status transition and the driver's
    /// name without touching associations.
    fn update_mplsvpn_status_and_name(
        &self,
        id: MplsVpnId,
        status: ResourceStatus,
        name: &str,
    ) -> StoreResult<()>;
    fn delete_mplsvpn(&self, id: MplsVpnId) -> StoreResult<()>;
}

/// SQLite-backed MPLS-VPN repository.
pub struct SqliteMplsVpnRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMplsVpnRepository<'conn> {
    /// Fails when the connection has not been migrated to the expected
    /// schema version or lacks the required tables/columns.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn load_record(&self, vpn: MplsVpn) -> StoreResult<MplsVpnRecord> {
        let attachment_circuits = list_child_ids(self.conn, &VPN_CIRCUIT_ASSOCIATIONS, vpn.id)?;
        Ok(MplsVpnRecord {
            vpn,
            attachment_circuits,
        })
    }
}

impl MplsVpnRepository for SqliteMplsVpnRepository<'_> {
    fn create_mplsvpn(
        &self,
        vpn: &MplsVpn,
        attachment_circuits: &[AttachmentCircuitId],
    ) -> StoreResult<MplsVpnId> {
        vpn.validate()?;

        let scope = TxScope::open(self.conn)?;
        self.conn.execute(
            "INSERT INTO mplsvpns (
                id,
                tenant_id,
                name,
                status,
                vpn_id,
                tunnel_type,
                tunnel_backup,
                qos,
                bandwidth
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                vpn.id.to_string(),
                vpn.tenant_id.as_str(),
                vpn.name.as_str(),
                vpn.status.as_str(),
                vpn.vpn_id.as_str(),
                vpn.tunnel_options.tunnel_type.as_str(),
                vpn.tunnel_options.tunnel_backup.as_str(),
                vpn.tunnel_options.qos.as_str(),
                vpn.tunnel_options.bandwidth,
            ],
        )?;
        reconcile_associations(
            self.conn,
            &VPN_CIRCUIT_ASSOCIATIONS,
            vpn.id,
            attachment_circuits,
        )?;
        scope.commit()?;

        Ok(vpn.id)
    }

    fn get_mplsvpn(&self, id: MplsVpnId) -> StoreResult<MplsVpnRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MPLSVPN_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let vpn = parse_mplsvpn_row(row)?;
            return self.load_record(vpn);
        }
        Err(StoreError::MplsVpnNotFound(id))
    }

    fn find_mplsvpn_for_tenant(&self, tenant_id: &str) -> StoreResult<Option<MplsVpnRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MPLSVPN_SELECT_SQL} WHERE tenant_id = ?1 ORDER BY id ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([tenant_id])?;

        if let Some(row) = rows.next()? {
            let vpn = parse_mplsvpn_row(row)?;
            return self.load_record(vpn).map(Some);
        }
        Ok(None)
    }

    fn find_mplsvpn_for_attachment_circuit(
        &self,
        attachmentcircuit_id: AttachmentCircuitId,
    ) -> StoreResult<Option<MplsVpnRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT mplsvpn_id
             FROM ac_mplsvpn_associations
             WHERE attachmentcircuit_id = ?1
             ORDER BY mplsvpn_id ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([attachmentcircuit_id.to_string()])?;

        if let Some(row) = rows.next()? {
            let parent: String = row.get(0)?;
            let parent_id = parse_uuid(&parent, "ac_mplsvpn_associations.mplsvpn_id")?;
            return self.get_mplsvpn(parent_id).map(Some);
        }
        Ok(None)
    }

    fn list_mplsvpns(&self, query: &MplsVpnListQuery) -> StoreResult<Vec<MplsVpnRecord>> {
        let mut sql = format!("{MPLSVPN_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tenant_id) = &query.tenant_id {
            sql.push_str(" AND tenant_id = ?");
            bind_values.push(Value::Text(tenant_id.clone()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut vpns = Vec::new();
        while let Some(row) = rows.next()? {
            vpns.push(parse_mplsvpn_row(row)?);
        }

        let mut records = Vec::with_capacity(vpns.len());
        for vpn in vpns {
            records.push(self.load_record(vpn)?);
        }
        Ok(records)
    }

    fn update_mplsvpn(
        &self,
        id: MplsVpnId,
        attachment_circuits: Option<&[AttachmentCircuitId]>,
    ) -> StoreResult<()> {
        let scope = TxScope::open(self.conn)?;
        ensure_resource_exists(self.conn, ResourceKind::MplsVpn, id)?;

        if let Some(attachment_circuits) = attachment_circuits {
            reconcile_associations(
                self.conn,
                &VPN_CIRCUIT_ASSOCIATIONS,
                id,
                attachment_circuits,
            )?;
        }
        scope.commit()?;
        Ok(())
    }

    fn update_mplsvpn_status_and_name(
        &self,
        id: MplsVpnId,
        status: ResourceStatus,
        name: &str,
    ) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE mplsvpns SET status = ?1, name = ?2 WHERE id = ?3;",
            params![status.as_str(), name, id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::MplsVpnNotFound(id));
        }
        Ok(())
    }

    fn delete_mplsvpn(&self, id: MplsVpnId) -> StoreResult<()> {
        delete_resource_row(self.conn, ResourceKind::MplsVpn, id)
    }
}

fn parse_mplsvpn_row(row: &Row<'_>) -> StoreResult<MplsVpn> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "mplsvpns.id")?;

    let status_text: String = row.get("status")?;
    let status = ResourceStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in mplsvpns.status"))
    })?;

    let tunnel_type_text: String = row.get("tunnel_type")?;
    let tunnel_type = TunnelType::parse(&tunnel_type_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid tunnel type `{tunnel_type_text}` in mplsvpns.tunnel_type"
        ))
    })?;

    let tunnel_backup_text: String = row.get("tunnel_backup")?;
    let tunnel_backup = TunnelBackup::parse(&tunnel_backup_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid tunnel backup `{tunnel_backup_text}` in mplsvpns.tunnel_backup"
        ))
    })?;

    let qos_text: String = row.get("qos")?;
    let qos = Qos::parse(&qos_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid qos `{qos_text}` in mplsvpns.qos"))
    })?;

    let bandwidth_raw: i64 = row.get("bandwidth")?;
    let bandwidth = u32::try_from(bandwidth_raw).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid bandwidth `{bandwidth_raw}` in mplsvpns.bandwidth"
        ))
    })?;

    let vpn = MplsVpn {
        id,
        tenant_id: row.get("tenant_id")?,
        name: row.get("name")?,
        vpn_id: row.get("vpn_id")?,
        status,
        tunnel_options: TunnelOptions {
            tunnel_type,
            tunnel_backup,
            qos,
            bandwidth,
        },
    };
    vpn.validate()?;
    Ok(vpn)
}
