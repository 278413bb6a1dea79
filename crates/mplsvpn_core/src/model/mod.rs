//! Domain model for the MPLS-VPN service abstraction.
//!
//! # Responsibility
//! - Define the persisted entity structures and their enumerated vocabularies.
//! - Hold the field groups shared across entities (ids, tenant scope, status).
//!
//! # Invariants
//! - Every entity is identified by a stable UUID generated at creation.
//! - Enumerated values keep their exact wire spellings (`fullmesh`, `Gold`,
//!   `PENDING_CREATE`, ...) in both storage and projections.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod circuit;
pub mod edge;
pub mod vpn;

/// Tenant scope identifier issued by the external identity system.
pub type TenantId = String;

/// Identifier of an externally owned virtual network.
pub type NetworkId = Uuid;

/// Lifecycle status shared by entities and association rows.
///
/// Transitions are owned by an external lifecycle driver; this store only
/// records the value it is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    PendingCreate,
    PendingUpdate,
    PendingDelete,
    Active,
    Down,
    Error,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingCreate => "PENDING_CREATE",
            Self::PendingUpdate => "PENDING_UPDATE",
            Self::PendingDelete => "PENDING_DELETE",
            Self::Active => "ACTIVE",
            Self::Down => "DOWN",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING_CREATE" => Some(Self::PendingCreate),
            "PENDING_UPDATE" => Some(Self::PendingUpdate),
            "PENDING_DELETE" => Some(Self::PendingDelete),
            "ACTIVE" => Some(Self::Active),
            "DOWN" => Some(Self::Down),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Display for ResourceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain field rejections raised before any SQL runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Provider edge name is blank after trim.
    EmptyProviderEdgeName,
    /// Tunnel bandwidth must be a positive integer.
    BandwidthNotPositive(u32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProviderEdgeName => write!(f, "provider edge name must not be blank"),
            Self::BandwidthNotPositive(value) => {
                write!(f, "tunnel bandwidth must be positive, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}
