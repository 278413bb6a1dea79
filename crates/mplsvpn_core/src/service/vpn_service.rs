//! MPLS-VPN use-case service.
//!
//! # Responsibility
//! - Shape VPN create/update payloads into validated domain records.
//! - Enforce the one-VPN-per-tenant rule at creation.
//! - Expose the lifecycle-driver status path and the caller projections.
//!
//! # Invariants
//! - Tunnel options default to fullmesh/frr/Gold/10; only fields present and
//!   non-empty in the payload's `tunnel_options` sub-object override, field
//!   by field. A zero bandwidth counts as absent.
//! - General updates carry circuit membership only; renames arrive through
//!   the status-and-name driver path.
//! - Every successful write returns the freshly read-back record.
//!
//! # See also
//! - docs/architecture/associations.md

use super::TenantResolver;
use crate::model::circuit::AttachmentCircuitId;
use crate::model::vpn::{MplsVpn, MplsVpnId, Qos, TunnelBackup, TunnelOptions, TunnelType};
use crate::model::{ResourceStatus, TenantId};
use crate::repo::vpn_repo::{MplsVpnListQuery, MplsVpnRecord, MplsVpnRepository};
use crate::repo::{ProjectionMap, StoreError, StoreResult};
use log::info;
use serde::Deserialize;

/// Field-by-field override of the default tunnel options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TunnelOptionsPatch {
    #[serde(default)]
    pub tunnel_type: Option<TunnelType>,
    #[serde(default)]
    pub tunnel_backup: Option<TunnelBackup>,
    #[serde(default)]
    pub qos: Option<Qos>,
    #[serde(default)]
    pub bandwidth: Option<u32>,
}

impl TunnelOptionsPatch {
    /// Resolves the patch against the defaults; absent fields keep theirs.
    ///
    /// A zero bandwidth counts as absent: only non-empty fields override.
    pub fn resolve(self) -> TunnelOptions {
        let defaults = TunnelOptions::default();
        TunnelOptions {
            tunnel_type: self.tunnel_type.unwrap_or(defaults.tunnel_type),
            tunnel_backup: self.tunnel_backup.unwrap_or(defaults.tunnel_backup),
            qos: self.qos.unwrap_or(defaults.qos),
            bandwidth: self
                .bandwidth
                .filter(|&bandwidth| bandwidth > 0)
                .unwrap_or(defaults.bandwidth),
        }
    }
}

/// Create payload for one VPN instance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMplsVpnRequest {
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vpn_id: String,
    #[serde(default)]
    pub tunnel_options: Option<TunnelOptionsPatch>,
    #[serde(default)]
    pub attachment_circuits: Vec<AttachmentCircuitId>,
}

/// Update payload for one VPN instance.
///
/// A present circuit list is the complete target membership, not a delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMplsVpnRequest {
    #[serde(default)]
    pub attachment_circuits: Option<Vec<AttachmentCircuitId>>,
}

/// VPN service facade over repository implementations.
pub struct MplsVpnService<R: MplsVpnRepository> {
    repo: R,
}

impl<R: MplsVpnRepository> MplsVpnService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one VPN instance with its initial circuit membership.
    ///
    /// Fails with `DuplicateMplsVpnForTenant` when the resolved tenant
    /// already owns a VPN; the error carries the pre-existing id.
    pub fn create_mplsvpn(
        &self,
        resolver: &dyn TenantResolver,
        request: CreateMplsVpnRequest,
    ) -> StoreResult<MplsVpnRecord> {
        let tenant_id = resolver.tenant_id_for_create(request.tenant_id);
        if let Some(existing) = self.repo.find_mplsvpn_for_tenant(&tenant_id)? {
            return Err(StoreError::DuplicateMplsVpnForTenant {
                mplsvpn_id: existing.vpn.id,
                tenant_id,
            });
        }

        let tunnel_options = request.tunnel_options.unwrap_or_default().resolve();
        let vpn = MplsVpn::new(tenant_id, request.name, request.vpn_id, tunnel_options);
        let id = self.repo.create_mplsvpn(&vpn, &request.attachment_circuits)?;

        let record = self.repo.get_mplsvpn(id)?;
        info!(
            "event=vpn_create module=service status=ok mplsvpn_id={id} tenant_id={} circuits={}",
            record.vpn.tenant_id,
            record.attachment_circuits.len()
        );
        Ok(record)
    }

    /// Gets one VPN projection by id.
    pub fn get_mplsvpn(
        &self,
        id: MplsVpnId,
        fields: Option<&[&str]>,
    ) -> StoreResult<ProjectionMap> {
        Ok(self.repo.get_mplsvpn(id)?.to_projection(fields))
    }

    /// Lists VPN projections matching the query.
    pub fn list_mplsvpns(
        &self,
        query: &MplsVpnListQuery,
        fields: Option<&[&str]>,
    ) -> StoreResult<Vec<ProjectionMap>> {
        let records = self.repo.list_mplsvpns(query)?;
        Ok(records
            .iter()
            .map(|record| record.to_projection(fields))
            .collect())
    }

    /// First VPN owned by the tenant, or `None`.
    pub fn mplsvpn_for_tenant(&self, tenant_id: &str) -> StoreResult<Option<MplsVpnRecord>> {
        self.repo.find_mplsvpn_for_tenant(tenant_id)
    }

    /// The VPN whose membership contains the circuit, or `None`.
    pub fn mplsvpn_for_attachment_circuit(
        &self,
        attachmentcircuit_id: AttachmentCircuitId,
    ) -> StoreResult<Option<MplsVpnRecord>> {
        self.repo
            .find_mplsvpn_for_attachment_circuit(attachmentcircuit_id)
    }

    /// Applies an update payload and returns the current record.
    pub fn update_mplsvpn(
        &self,
        id: MplsVpnId,
        request: UpdateMplsVpnRequest,
    ) -> StoreResult<MplsVpnRecord> {
        self.repo
            .update_mplsvpn(id, request.attachment_circuits.as_deref())?;

        let record = self.repo.get_mplsvpn(id)?;
        info!("event=vpn_update module=service status=ok mplsvpn_id={id}");
        Ok(record)
    }

    /// Lifecycle-driver path: pushes a status transition plus the driver's
    /// current name, without touching associations.
    pub fn update_mplsvpn_status_and_name(
        &self,
        id: MplsVpnId,
        status: ResourceStatus,
        name: &str,
    ) -> StoreResult<MplsVpnRecord> {
        self.repo.update_mplsvpn_status_and_name(id, status, name)?;

        let record = self.repo.get_mplsvpn(id)?;
        info!(
            "event=vpn_status_update module=service status=ok mplsvpn_id={id} vpn_status={status}"
        );
        Ok(record)
    }

    /// Deletes one VPN; cascade removes its association rows.
    pub fn delete_mplsvpn(&self, id: MplsVpnId) -> StoreResult<()> {
        self.repo.delete_mplsvpn(id)?;
        info!("event=vpn_delete module=service status=ok mplsvpn_id={id}");
        Ok(())
    }
}
