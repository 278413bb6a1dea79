//! Attachment circuit domain model.
//!
//! # Responsibility
//! - Define the customer-facing attachment point record.
//!
//! # Invariants
//! - `provider_edge_id` must reference an existing provider edge (enforced by
//!   the storage foreign key).
//!
//! # See also
//! - docs/architecture/data-model.md

use super::edge::ProviderEdgeId;
use super::TenantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one attachment circuit.
pub type AttachmentCircuitId = Uuid;

/// Layer at which the circuit attaches customer networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    L2,
    L3,
}

impl NetworkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "L2" => Some(Self::L2),
            "L3" => Some(Self::L3),
            _ => None,
        }
    }
}

/// Canonical attachment circuit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentCircuit {
    /// Stable global ID used for association rows and lookups.
    pub id: AttachmentCircuitId,
    /// Owning tenant scope.
    pub tenant_id: TenantId,
    pub name: String,
    pub network_type: NetworkType,
    /// Provider edge device terminating this circuit.
    pub provider_edge_id: ProviderEdgeId,
}

impl AttachmentCircuit {
    /// Creates a new circuit record with a generated stable ID.
    pub fn new(
        tenant_id: impl Into<TenantId>,
        name: impl Into<String>,
        network_type: NetworkType,
        provider_edge_id: ProviderEdgeId,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            tenant_id,
            name,
            network_type,
            provider_edge_id,
        )
    }

    /// Creates a circuit record with a caller-provided stable ID.
    pub fn with_id(
        id: AttachmentCircuitId,
        tenant_id: impl Into<TenantId>,
        name: impl Into<String>,
        network_type: NetworkType,
        provider_edge_id: ProviderEdgeId,
    ) -> Self {
        Self {
            id,
            tenant_id: tenant_id.into(),
            name: name.into(),
            network_type,
            provider_edge_id,
        }
    }
}
