//! Attachment circuit use-case service.
//!
//! # Responsibility
//! - Shape circuit create/update payloads into validated domain records.
//! - Enforce the one-circuit-per-tenant rule at creation.
//! - Derive VLAN tags for a circuit's networks via the segment lookup seam.
//!
//! # Invariants
//! - General updates carry network membership only.
//! - Single-network attach/detach operations are idempotent.
//! - Every successful create/update returns the freshly read-back record.
//!
//! # See also
//! - docs/architecture/associations.md

use super::{SegmentLookup, TenantResolver};
use crate::model::circuit::{AttachmentCircuit, AttachmentCircuitId, NetworkType};
use crate::model::edge::ProviderEdgeId;
use crate::model::{NetworkId, TenantId};
use crate::repo::circuit_repo::{
    AttachmentCircuitListQuery, AttachmentCircuitRecord, AttachmentCircuitRepository,
};
use crate::repo::{ProjectionMap, StoreError, StoreResult};
use log::info;
use serde::Deserialize;

/// Create payload for one attachment circuit.
///
/// `network_type` and `provider_edge_id` are mandatory payload keys.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachmentCircuitRequest {
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub name: String,
    pub network_type: NetworkType,
    pub provider_edge_id: ProviderEdgeId,
    #[serde(default)]
    pub networks: Vec<NetworkId>,
}

/// Update payload for one attachment circuit.
///
/// A present network list is the complete target membership, not a delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttachmentCircuitRequest {
    #[serde(default)]
    pub networks: Option<Vec<NetworkId>>,
}

/// Attachment circuit service facade over repository implementations.
pub struct AttachmentCircuitService<R: AttachmentCircuitRepository> {
    repo: R,
}

impl<R: AttachmentCircuitRepository> AttachmentCircuitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one circuit with its initial network membership.
    ///
    /// Fails with `DuplicateAttachmentCircuitForTenant` when the resolved
    /// tenant already owns a circuit; the error carries the pre-existing id.
    pub fn create_attachment_circuit(
        &self,
        resolver: &dyn TenantResolver,
        request: CreateAttachmentCircuitRequest,
    ) -> StoreResult<AttachmentCircuitRecord> {
        let tenant_id = resolver.tenant_id_for_create(request.tenant_id);
        if let Some(existing) = self.repo.find_attachment_circuit_for_tenant(&tenant_id)? {
            return Err(StoreError::DuplicateAttachmentCircuitForTenant {
                attachmentcircuit_id: existing.circuit.id,
                tenant_id,
            });
        }

        let circuit = AttachmentCircuit::new(
            tenant_id,
            request.name,
            request.network_type,
            request.provider_edge_id,
        );
        let id = self
            .repo
            .create_attachment_circuit(&circuit, &request.networks)?;

        let record = self.repo.get_attachment_circuit(id)?;
        info!(
            "event=circuit_create module=service status=ok attachmentcircuit_id={id} tenant_id={} networks={}",
            record.circuit.tenant_id,
            record.networks.len()
        );
        Ok(record)
    }

    /// Gets one circuit projection by id.
    pub fn get_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        fields: Option<&[&str]>,
    ) -> StoreResult<ProjectionMap> {
        Ok(self.repo.get_attachment_circuit(id)?.to_projection(fields))
    }

    /// Lists circuit projections matching the query.
    pub fn list_attachment_circuits(
        &self,
        query: &AttachmentCircuitListQuery,
        fields: Option<&[&str]>,
    ) -> StoreResult<Vec<ProjectionMap>> {
        let records = self.repo.list_attachment_circuits(query)?;
        Ok(records
            .iter()
            .map(|record| record.to_projection(fields))
            .collect())
    }

    /// First circuit owned by the tenant, or `None`.
    pub fn attachment_circuit_for_tenant(
        &self,
        tenant_id: &str,
    ) -> StoreResult<Option<AttachmentCircuitRecord>> {
        self.repo.find_attachment_circuit_for_tenant(tenant_id)
    }

    /// Applies an update payload and returns the current record.
    pub fn update_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        request: UpdateAttachmentCircuitRequest,
    ) -> StoreResult<AttachmentCircuitRecord> {
        self.repo
            .update_attachment_circuit(id, request.networks.as_deref())?;

        let record = self.repo.get_attachment_circuit(id)?;
        info!("event=circuit_update module=service status=ok attachmentcircuit_id={id}");
        Ok(record)
    }

    /// Idempotently attaches one network and returns the current record.
    pub fn add_network_to_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<AttachmentCircuitRecord> {
        self.repo.add_network_to_attachment_circuit(id, network_id)?;
        self.repo.get_attachment_circuit(id)
    }

    /// Idempotently detaches one network and returns the current record.
    pub fn remove_network_from_attachment_circuit(
        &self,
        id: AttachmentCircuitId,
        network_id: NetworkId,
    ) -> StoreResult<AttachmentCircuitRecord> {
        self.repo
            .remove_network_from_attachment_circuit(id, network_id)?;
        self.repo.get_attachment_circuit(id)
    }

    /// Deletes one circuit; cascade removes its network association rows.
    ///
    /// A circuit still referenced by a VPN association cannot be deleted;
    /// the foreign key failure propagates as a storage error.
    pub fn delete_attachment_circuit(&self, id: AttachmentCircuitId) -> StoreResult<()> {
        self.repo.delete_attachment_circuit(id)?;
        info!("event=circuit_delete module=service status=ok attachmentcircuit_id={id}");
        Ok(())
    }

    /// Flattens the VLAN tags of every network attached to the record.
    ///
    /// Tags are rendered as strings in network-list order.
    pub fn vlans_for_attachment_circuit(
        &self,
        lookup: &dyn SegmentLookup,
        record: &AttachmentCircuitRecord,
    ) -> StoreResult<Vec<String>> {
        let mut vlans = Vec::new();
        for network_id in &record.networks {
            for segment in lookup.segments_for_network(*network_id)? {
                vlans.push(segment.segmentation_id.to_string());
            }
        }
        Ok(vlans)
    }

    /// VLAN tags for the circuit's networks, starting from a circuit id.
    pub fn vlans_for_attachment_circuit_id(
        &self,
        lookup: &dyn SegmentLookup,
        id: AttachmentCircuitId,
    ) -> StoreResult<Vec<String>> {
        let record = self.repo.get_attachment_circuit(id)?;
        self.vlans_for_attachment_circuit(lookup, &record)
    }
}
