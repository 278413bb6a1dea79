//! Association-set reconciliation for many-to-many membership tables.
//!
//! # Responsibility
//! - Synchronize a join table's rows for one parent to a target child set.
//! - Keep rows in the intersection untouched (no delete+reinsert churn).
//!
//! # Invariants
//! - Runs inside its own transaction scope; partial membership changes are
//!   never visible.
//! - New association rows start with status `ACTIVE`.
//! - Desired child keys are deduplicated; order is irrelevant.
//! - Child existence is not pre-validated; a bad reference fails at the
//!   foreign key and propagates as a storage error.
//!
//! # See also
//! - docs/releases/v0.1/prs/PR-0006-association-reconcile.md

use super::accessor::{ensure_resource_exists, ResourceKind};
use super::{parse_uuid, StoreResult};
use crate::db::TxScope;
use crate::model::ResourceStatus;
use log::debug;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Static descriptor of one many-to-many membership table.
#[derive(Debug, Clone, Copy)]
pub struct AssociationTable {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub child_column: &'static str,
    /// Entity kind used for the typed parent not-found translation.
    pub parent_kind: ResourceKind,
}

/// VPN -> attachment circuit membership.
pub const VPN_CIRCUIT_ASSOCIATIONS: AssociationTable = AssociationTable {
    table: "ac_mplsvpn_associations",
    parent_column: "mplsvpn_id",
    child_column: "attachmentcircuit_id",
    parent_kind: ResourceKind::MplsVpn,
};

/// Attachment circuit -> network membership.
pub const CIRCUIT_NETWORK_ASSOCIATIONS: AssociationTable = AssociationTable {
    table: "ac_network_associations",
    parent_column: "attachmentcircuit_id",
    child_column: "network_id",
    parent_kind: ResourceKind::AttachmentCircuit,
};

/// Write counts reported by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub inserted: usize,
    pub deleted: usize,
}

impl ReconcileOutcome {
    /// True when the pass changed nothing.
    pub fn is_noop(self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

/// Synchronizes the membership rows for `parent_id` to `desired`.
///
/// # Contract
/// - `desired` is the complete target child set, not a delta.
/// - After success the stored child set equals the deduplicated `desired`;
///   rows already in both sets keep their identity and status.
///
/// # Errors
/// - The parent's typed not-found error when `parent_id` does not exist.
/// - `StoreError::Db` when a desired child violates the foreign key.
pub fn reconcile_associations(
    conn: &Connection,
    table: &AssociationTable,
    parent_id: Uuid,
    desired: &[Uuid],
) -> StoreResult<ReconcileOutcome> {
    let scope = TxScope::open(conn)?;
    ensure_resource_exists(conn, table.parent_kind, parent_id)?;

    let desired_set: BTreeSet<Uuid> = desired.iter().copied().collect();
    let existing_set: BTreeSet<Uuid> = list_child_ids(conn, table, parent_id)?
        .into_iter()
        .collect();

    let mut outcome = ReconcileOutcome::default();

    let mut delete_stmt = conn.prepare(&format!(
        "DELETE FROM {} WHERE {} = ?1 AND {} = ?2;",
        table.table, table.parent_column, table.child_column
    ))?;
    for child_id in existing_set.difference(&desired_set) {
        delete_stmt.execute(params![parent_id.to_string(), child_id.to_string()])?;
        outcome.deleted += 1;
    }

    let mut insert_stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}, {}, status) VALUES (?1, ?2, ?3);",
        table.table, table.parent_column, table.child_column
    ))?;
    for child_id in desired_set.difference(&existing_set) {
        insert_stmt.execute(params![
            parent_id.to_string(),
            child_id.to_string(),
            ResourceStatus::Active.as_str(),
        ])?;
        outcome.inserted += 1;
    }

    scope.commit()?;
    debug!(
        "event=assoc_reconcile module=repo status=ok table={} parent_id={} inserted={} deleted={}",
        table.table, parent_id, outcome.inserted, outcome.deleted
    );
    Ok(outcome)
}

/// Loads the child ids associated with `parent_id`, ascending id order.
pub(crate) fn list_child_ids(
    conn: &Connection,
    table: &AssociationTable,
    parent_id: Uuid,
) -> StoreResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE {} = ?1 ORDER BY {} ASC;",
        table.child_column, table.table, table.parent_column, table.child_column
    ))?;

    let mut rows = stmt.query([parent_id.to_string()])?;
    let mut children = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        children.push(parse_uuid(&value, table.child_column)?);
    }
    Ok(children)
}
