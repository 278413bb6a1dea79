//! Core persistence and consistency logic for the MPLS-VPN service
//! abstraction. This crate is the single source of truth for the entity
//! model, the association reconciliation algorithm, and the typed error
//! contract.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult, TxScope};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::circuit::{AttachmentCircuit, AttachmentCircuitId, NetworkType};
pub use model::edge::{ProviderEdge, ProviderEdgeId};
pub use model::vpn::{MplsVpn, MplsVpnId, Qos, TunnelBackup, TunnelOptions, TunnelType};
pub use model::{NetworkId, ResourceStatus, TenantId, ValidationError};
pub use repo::circuit_repo::{
    AttachmentCircuitListQuery, AttachmentCircuitRecord, AttachmentCircuitRepository,
    SqliteAttachmentCircuitRepository,
};
pub use repo::edge_repo::{
    ProviderEdgeListQuery, ProviderEdgeRepository, SqliteProviderEdgeRepository,
};
pub use repo::reconcile::{
    reconcile_associations, AssociationTable, ReconcileOutcome, CIRCUIT_NETWORK_ASSOCIATIONS,
    VPN_CIRCUIT_ASSOCIATIONS,
};
pub use repo::vpn_repo::{
    MplsVpnListQuery, MplsVpnRecord, MplsVpnRepository, SqliteMplsVpnRepository,
};
pub use repo::{ProjectionMap, StoreError, StoreResult};
pub use service::circuit_service::{
    AttachmentCircuitService, CreateAttachmentCircuitRequest, UpdateAttachmentCircuitRequest,
};
pub use service::edge_service::{
    CreateProviderEdgeRequest, ProviderEdgeService, UpdateProviderEdgeRequest,
};
pub use service::vpn_service::{
    CreateMplsVpnRequest, MplsVpnService, TunnelOptionsPatch, UpdateMplsVpnRequest,
};
pub use service::{NetworkSegment, ScopedTenantResolver, SegmentLookup, TenantResolver};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
