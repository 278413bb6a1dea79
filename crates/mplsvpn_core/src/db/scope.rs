//! Re-entrant transaction scope over a shared SQLite connection.
//!
//! # Responsibility
//! - Demarcate atomic write scopes for repository operations.
//! - Nest transparently when the caller already holds an open transaction.
//!
//! # Invariants
//! - A scope opened on an autocommit connection is a real `BEGIN IMMEDIATE`
//!   transaction; otherwise it is a uniquely named `SAVEPOINT`.
//! - Dropping an uncommitted scope rolls back its writes and never panics.
//! - Scopes must be resolved in reverse open order (stack discipline).
//!
//! # See also
//! - docs/architecture/transactions.md

use super::DbResult;
use log::error;
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

enum ScopeMode {
    /// Owns a top-level immediate transaction.
    Root,
    /// Nested savepoint inside a caller-held transaction.
    Nested { name: String },
}

/// RAII guard for one atomic write scope.
///
/// Every repository write path opens its own scope, so each operation is
/// atomic standalone and becomes a subtransaction when invoked from within a
/// larger caller-managed transaction.
pub struct TxScope<'conn> {
    conn: &'conn Connection,
    mode: ScopeMode,
    finished: bool,
}

impl<'conn> TxScope<'conn> {
    /// Opens a new scope on the connection.
    ///
    /// # Errors
    /// - Propagates SQLite failures from `BEGIN IMMEDIATE` / `SAVEPOINT`,
    ///   e.g. lock acquisition timeouts.
    pub fn open(conn: &'conn Connection) -> DbResult<Self> {
        let mode = if conn.is_autocommit() {
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            ScopeMode::Root
        } else {
            let name = format!("scope_{}", NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed));
            conn.execute_batch(&format!("SAVEPOINT {name};"))?;
            ScopeMode::Nested { name }
        };

        Ok(Self {
            conn,
            mode,
            finished: false,
        })
    }

    /// Commits this scope.
    ///
    /// For a root scope this commits the transaction; for a nested scope the
    /// savepoint is released into the enclosing transaction, whose eventual
    /// commit or rollback still bounds these writes.
    pub fn commit(mut self) -> DbResult<()> {
        match &self.mode {
            ScopeMode::Root => self.conn.execute_batch("COMMIT;")?,
            ScopeMode::Nested { name } => self.conn.execute_batch(&format!("RELEASE {name};"))?,
        }
        self.finished = true;
        Ok(())
    }
}

impl Drop for TxScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let result = match &self.mode {
            ScopeMode::Root => self.conn.execute_batch("ROLLBACK;"),
            ScopeMode::Nested { name } => self
                .conn
                .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};")),
        };

        if let Err(err) = result {
            error!("event=scope_rollback module=db status=error error={err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TxScope;
    use rusqlite::Connection;

    fn scratch_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE entries (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")
            .unwrap();
        conn
    }

    fn count_entries(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn committed_root_scope_persists_writes() {
        let conn = scratch_conn();

        let scope = TxScope::open(&conn).unwrap();
        conn.execute("INSERT INTO entries (label) VALUES ('a');", [])
            .unwrap();
        scope.commit().unwrap();

        assert!(conn.is_autocommit());
        assert_eq!(count_entries(&conn), 1);
    }

    #[test]
    fn dropped_uncommitted_scope_rolls_back() {
        let conn = scratch_conn();

        {
            let _scope = TxScope::open(&conn).unwrap();
            conn.execute("INSERT INTO entries (label) VALUES ('a');", [])
                .unwrap();
        }

        assert!(conn.is_autocommit());
        assert_eq!(count_entries(&conn), 0);
    }

    #[test]
    fn failed_nested_scope_keeps_outer_writes() {
        let conn = scratch_conn();

        let outer = TxScope::open(&conn).unwrap();
        conn.execute("INSERT INTO entries (label) VALUES ('outer');", [])
            .unwrap();

        {
            let _inner = TxScope::open(&conn).unwrap();
            conn.execute("INSERT INTO entries (label) VALUES ('inner');", [])
                .unwrap();
        }

        outer.commit().unwrap();
        let labels: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT label FROM entries ORDER BY label ASC;")
                .unwrap();
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
            rows
        };
        assert_eq!(labels, vec!["outer".to_string()]);
    }

    #[test]
    fn outer_rollback_erases_committed_nested_scope() {
        let conn = scratch_conn();

        {
            let _outer = TxScope::open(&conn).unwrap();
            let inner = TxScope::open(&conn).unwrap();
            conn.execute("INSERT INTO entries (label) VALUES ('inner');", [])
                .unwrap();
            inner.commit().unwrap();
        }

        assert_eq!(count_entries(&conn), 0);
    }
}
