//! Typed single-row access primitives shared by every repository.
//!
//! # Responsibility
//! - Translate primary-key lookup misses into per-entity typed errors.
//! - Provide the shared exists/delete-by-id operations.
//!
//! # Invariants
//! - A lookup miss always maps through `ResourceKind::not_found`; callers
//!   never see a generic "row missing" error.
//! - No retries, no side effects beyond the requested statement.

use super::{StoreError, StoreResult};
use rusqlite::Connection;
use uuid::Uuid;

/// Entity tag keying the per-entity-type error mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    MplsVpn,
    AttachmentCircuit,
    ProviderEdge,
}

impl ResourceKind {
    fn table(self) -> &'static str {
        match self {
            Self::MplsVpn => "mplsvpns",
            Self::AttachmentCircuit => "attachment_circuits",
            Self::ProviderEdge => "provider_edges",
        }
    }

    /// Builds this entity's typed not-found error for the missing id.
    pub fn not_found(self, id: Uuid) -> StoreError {
        match self {
            Self::MplsVpn => StoreError::MplsVpnNotFound(id),
            Self::AttachmentCircuit => StoreError::AttachmentCircuitNotFound(id),
            Self::ProviderEdge => StoreError::ProviderEdgeNotFound(id),
        }
    }
}

/// Fails with the entity's typed not-found error when the row is absent.
pub fn ensure_resource_exists(conn: &Connection, kind: ResourceKind, id: Uuid) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            kind.table()
        ),
        [id.to_string()],
        |row| row.get(0),
    )?;

    if exists == 1 {
        Ok(())
    } else {
        Err(kind.not_found(id))
    }
}

/// Deletes one row by primary key, failing typed when absent.
///
/// Association rows owned by the entity are removed by the schema's cascade
/// rules within the same statement.
pub fn delete_resource_row(conn: &Connection, kind: ResourceKind, id: Uuid) -> StoreResult<()> {
    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1;", kind.table()),
        [id.to_string()],
    )?;

    if changed == 0 {
        return Err(kind.not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ensure_resource_exists, ResourceKind};
    use crate::db::open_db_in_memory;
    use crate::repo::StoreError;
    use uuid::Uuid;

    #[test]
    fn each_kind_maps_to_its_own_not_found_variant() {
        let conn = open_db_in_memory().unwrap();
        let missing = Uuid::new_v4();

        let err = ensure_resource_exists(&conn, ResourceKind::MplsVpn, missing).unwrap_err();
        assert!(matches!(err, StoreError::MplsVpnNotFound(id) if id == missing));

        let err =
            ensure_resource_exists(&conn, ResourceKind::AttachmentCircuit, missing).unwrap_err();
        assert!(matches!(err, StoreError::AttachmentCircuitNotFound(id) if id == missing));

        let err = ensure_resource_exists(&conn, ResourceKind::ProviderEdge, missing).unwrap_err();
        assert!(matches!(err, StoreError::ProviderEdgeNotFound(id) if id == missing));
    }
}
