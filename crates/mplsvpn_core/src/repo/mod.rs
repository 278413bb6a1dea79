//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Own the association reconciliation algorithm and typed lookup errors.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes run inside their own transaction scope and validate
//!   domain fields before SQL mutations.
//! - Lookup misses surface as per-entity typed errors (`MplsVpnNotFound`,
//!   ...), never as generic storage errors.
//! - Referential-integrity failures propagate unmodified as `StoreError::Db`.
//!
//! # See also
//! - docs/releases/v0.1/prs/PR-0003-entity-store.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::circuit::AttachmentCircuitId;
use crate::model::edge::ProviderEdgeId;
use crate::model::vpn::MplsVpnId;
use crate::model::{TenantId, ValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod accessor;
pub mod circuit_repo;
pub mod edge_repo;
pub mod reconcile;
pub mod vpn_repo;

pub type StoreResult<T> = Result<T, StoreError>;

/// JSON object shape produced by entity projections.
pub type ProjectionMap = serde_json::Map<String, serde_json::Value>;

/// Store error taxonomy shared by repositories and services.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap failure, including referential-integrity
    /// violations propagated unmodified.
    Db(DbError),
    /// Domain field rejection raised before any SQL runs.
    Validation(ValidationError),
    /// VPN lookup miss.
    MplsVpnNotFound(MplsVpnId),
    /// Attachment circuit lookup miss.
    AttachmentCircuitNotFound(AttachmentCircuitId),
    /// Provider edge lookup miss.
    ProviderEdgeNotFound(ProviderEdgeId),
    /// Tenant already owns a VPN; carries the pre-existing id.
    DuplicateMplsVpnForTenant {
        mplsvpn_id: MplsVpnId,
        tenant_id: TenantId,
    },
    /// Tenant already owns an attachment circuit; carries the pre-existing id.
    DuplicateAttachmentCircuitForTenant {
        attachmentcircuit_id: AttachmentCircuitId,
        tenant_id: TenantId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl StoreError {
    /// True for referential-integrity and other constraint failures
    /// propagated unmodified from storage.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::MplsVpnNotFound(id) => write!(f, "mplsvpn not found: {id}"),
            Self::AttachmentCircuitNotFound(id) => {
                write!(f, "attachment circuit not found: {id}")
            }
            Self::ProviderEdgeNotFound(id) => write!(f, "provider edge not found: {id}"),
            Self::DuplicateMplsVpnForTenant {
                mplsvpn_id,
                tenant_id,
            } => write!(f, "tenant {tenant_id} already has mplsvpn {mplsvpn_id}"),
            Self::DuplicateAttachmentCircuitForTenant {
                attachmentcircuit_id,
                tenant_id,
            } => write!(
                f,
                "tenant {tenant_id} already has attachment circuit {attachmentcircuit_id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted store data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Applies the optional field-projection filter to one projection map.
///
/// Unknown field names are ignored; `None` returns the map unchanged.
pub fn restrict_fields(map: ProjectionMap, fields: Option<&[&str]>) -> ProjectionMap {
    match fields {
        None => map,
        Some(fields) => map
            .into_iter()
            .filter(|(key, _)| fields.contains(&key.as_str()))
            .collect(),
    }
}

/// One table plus the columns a repository requires from it.
pub(crate) type TableRequirement = (&'static str, &'static [&'static str]);

/// Verifies schema version and required tables/columns for a repository.
pub(crate) fn ensure_store_ready(
    conn: &Connection,
    required: &[TableRequirement],
) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
