//! MPLS-VPN domain model.
//!
//! # Responsibility
//! - Define the VPN instance record and its tunnel option vocabulary.
//! - Own tunnel-option defaulting used by VPN creation.
//!
//! # Invariants
//! - A fresh VPN starts in `PENDING_CREATE`; later transitions come from the
//!   external lifecycle driver.
//! - `bandwidth` is a positive integer (validated before persistence).
//!
//! # See also
//! - docs/architecture/data-model.md

use super::{ResourceStatus, TenantId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one MPLS-VPN instance.
pub type MplsVpnId = Uuid;

/// Default tunnel bandwidth applied when the create payload omits it.
pub const DEFAULT_BANDWIDTH: u32 = 10;

/// Tunnel topology for the VPN overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelType {
    #[serde(rename = "fullmesh")]
    FullMesh,
    #[serde(rename = "Customized")]
    Customized,
}

impl TunnelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullMesh => "fullmesh",
            Self::Customized => "Customized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fullmesh" => Some(Self::FullMesh),
            "Customized" => Some(Self::Customized),
            _ => None,
        }
    }
}

/// Backup path strategy for VPN tunnels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelBackup {
    #[serde(rename = "frr")]
    Frr,
    #[serde(rename = "Secondary")]
    Secondary,
}

impl TunnelBackup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frr => "frr",
            Self::Secondary => "Secondary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "frr" => Some(Self::Frr),
            "Secondary" => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Service quality class for the VPN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Qos {
    Gold,
    Silver,
    Bronze,
}

impl Qos {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Bronze => "Bronze",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Gold" => Some(Self::Gold),
            "Silver" => Some(Self::Silver),
            "Bronze" => Some(Self::Bronze),
            _ => None,
        }
    }
}

/// Resolved tunnel configuration carried by every VPN row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelOptions {
    pub tunnel_type: TunnelType,
    pub tunnel_backup: TunnelBackup,
    pub qos: Qos,
    pub bandwidth: u32,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        Self {
            tunnel_type: TunnelType::FullMesh,
            tunnel_backup: TunnelBackup::Frr,
            qos: Qos::Gold,
            bandwidth: DEFAULT_BANDWIDTH,
        }
    }
}

impl TunnelOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bandwidth == 0 {
            return Err(ValidationError::BandwidthNotPositive(self.bandwidth));
        }
        Ok(())
    }
}

/// Canonical VPN instance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MplsVpn {
    /// Stable global ID used for association rows and lookups.
    pub id: MplsVpnId,
    /// Owning tenant scope.
    pub tenant_id: TenantId,
    pub name: String,
    /// External VPN identifier assigned by the provisioning backend.
    pub vpn_id: String,
    pub status: ResourceStatus,
    pub tunnel_options: TunnelOptions,
}

impl MplsVpn {
    /// Creates a new VPN record with a generated stable ID.
    ///
    /// # Invariants
    /// - `status` starts as `PENDING_CREATE`.
    pub fn new(
        tenant_id: impl Into<TenantId>,
        name: impl Into<String>,
        vpn_id: impl Into<String>,
        tunnel_options: TunnelOptions,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), tenant_id, name, vpn_id, tunnel_options)
    }

    /// Creates a VPN record with a caller-provided stable ID.
    ///
    /// Used by hosts that carry identity externally.
    pub fn with_id(
        id: MplsVpnId,
        tenant_id: impl Into<TenantId>,
        name: impl Into<String>,
        vpn_id: impl Into<String>,
        tunnel_options: TunnelOptions,
    ) -> Self {
        Self {
            id,
            tenant_id: tenant_id.into(),
            name: name.into(),
            vpn_id: vpn_id.into(),
            status: ResourceStatus::PendingCreate,
            tunnel_options,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tunnel_options.validate()
    }
}
