//! Provider edge domain model.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one provider edge device.
pub type ProviderEdgeId = Uuid;

/// Physical or logical device terminating customer attachment circuits.
///
/// Provider edges are not tenant-scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEdge {
    pub id: ProviderEdgeId,
    pub name: String,
}

impl ProviderEdge {
    /// Creates a new provider edge record with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a provider edge record with a caller-provided stable ID.
    pub fn with_id(id: ProviderEdgeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyProviderEdgeName);
        }
        Ok(())
    }
}
