//! Connection handle and compiled statements.
//!
//! A [`DatabaseWrapper`] borrows a SQLite connection and compiles SQL into
//! [`DatabaseStatement`]s. Statements are released when dropped, so every
//! exit path of the code that owns them (including `?` returns) finalizes
//! them exactly once. Compile and release counts are recorded in
//! [`StatementStats`] for monitoring.

use rusqlite::types::ToSql;
use rusqlite::{Connection, Statement};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error type for storage and saver operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Counters for statements compiled and released through a wrapper.
#[derive(Debug, Default)]
pub struct StatementStats {
    compiled: AtomicU64,
    released: AtomicU64,
}

impl StatementStats {
    /// Create a new zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total statements compiled.
    pub fn compiled(&self) -> u64 {
        self.compiled.load(Ordering::SeqCst)
    }

    /// Total statements released.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Statements compiled but not yet released.
    pub fn open(&self) -> u64 {
        self.compiled().saturating_sub(self.released())
    }
}

/// Store-connection handle passed to adapters, savers and transaction work.
pub struct DatabaseWrapper<'c> {
    conn: &'c Connection,
    stats: Arc<StatementStats>,
    cancel: Option<CancellationToken>,
}

impl<'c> DatabaseWrapper<'c> {
    /// Wrap a connection with a fresh set of statement counters.
    pub fn new(conn: &'c Connection) -> Self {
        Self::with_stats(conn, Arc::new(StatementStats::new()))
    }

    /// Wrap a connection, recording statements into shared counters.
    pub fn with_stats(conn: &'c Connection, stats: Arc<StatementStats>) -> Self {
        Self {
            conn,
            stats,
            cancel: None,
        }
    }

    /// Attach the cancellation token of the transaction this wrapper runs in.
    pub(crate) fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The underlying connection, for queries outside the statement API.
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Statement counters for this wrapper.
    pub fn stats(&self) -> &Arc<StatementStats> {
        &self.stats
    }

    /// Whether the enclosing async transaction has been cancelled.
    ///
    /// Long-running work can poll this to stop early. Always false outside
    /// the transaction executor.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Compile `sql` into a statement bound to this connection.
    pub fn compile_statement(&self, sql: &str) -> Result<DatabaseStatement<'c>, StoreError> {
        let stmt = self.conn.prepare(sql)?;
        self.stats.compiled.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(sql, "Statement compiled");
        Ok(DatabaseStatement {
            stmt,
            conn: self.conn,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// A compiled, connection-bound statement.
///
/// Reusable for any number of executions; released exactly once on drop.
pub struct DatabaseStatement<'c> {
    stmt: Statement<'c>,
    conn: &'c Connection,
    stats: Arc<StatementStats>,
}

impl DatabaseStatement<'_> {
    /// Bind a value to a 1-based parameter index.
    pub fn bind<V: ToSql>(&mut self, index: usize, value: V) -> Result<(), StoreError> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind SQL NULL to a 1-based parameter index.
    pub fn bind_null(&mut self, index: usize) -> Result<(), StoreError> {
        self.bind(index, rusqlite::types::Null)
    }

    /// Execute an INSERT, returning the generated row id.
    ///
    /// Returns 0 when no row was inserted (for example `INSERT OR IGNORE`
    /// hitting a conflict).
    pub fn execute_insert(&mut self) -> Result<i64, StoreError> {
        let changed = self.stmt.raw_execute()?;
        if changed == 0 {
            return Ok(0);
        }
        Ok(self.conn.last_insert_rowid())
    }

    /// Execute an UPDATE or DELETE, returning the affected row count.
    pub fn execute_update_delete(&mut self) -> Result<usize, StoreError> {
        Ok(self.stmt.raw_execute()?)
    }

    /// Release the statement now.
    pub fn close(self) {}
}

impl Drop for DatabaseStatement<'_> {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("Statement released");
    }
}
