//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into per-entity create/update/delete APIs.
//! - Enforce the per-tenant singleton rule for VPNs and attachment circuits.
//! - Define the trait seams for externally-owned collaborators (tenant
//!   resolution, network segment data).
//!
//! # Invariants
//! - Services never open connections; they orchestrate injected
//!   repositories and collaborators.
//! - Every successful create/update returns the freshly read-back record.
//!
//! # See also
//! - docs/architecture/associations.md

pub mod circuit_service;
pub mod edge_service;
pub mod vpn_service;

use crate::model::{NetworkId, TenantId};
use crate::repo::StoreResult;

/// One segment of an externally-owned virtual network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSegment {
    /// VLAN tag (or equivalent encapsulation id) of the segment.
    pub segmentation_id: i64,
}

/// Lookup seam for segment data owned by another subsystem.
///
/// Implementations own their own data access; this crate never writes
/// segment data.
pub trait SegmentLookup {
    fn segments_for_network(&self, network_id: NetworkId) -> StoreResult<Vec<NetworkSegment>>;
}

/// Resolves the tenant scope applied to create requests.
///
/// Authorization policy lives with the host; by the time a payload reaches
/// this crate the resolver's answer is authoritative.
pub trait TenantResolver {
    fn tenant_id_for_create(&self, payload_tenant: Option<TenantId>) -> TenantId;
}

/// Default resolver: prefer the payload tenant, fall back to a fixed scope.
#[derive(Debug, Clone)]
pub struct ScopedTenantResolver {
    scope: TenantId,
}

impl ScopedTenantResolver {
    pub fn new(scope: impl Into<TenantId>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

impl TenantResolver for ScopedTenantResolver {
    fn tenant_id_for_create(&self, payload_tenant: Option<TenantId>) -> TenantId {
        payload_tenant.unwrap_or_else(|| self.scope.clone())
    }
}
