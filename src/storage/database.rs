//! Pooled database access.
//!
//! Uses r2d2 with r2d2_sqlite. Every connection gets the pragmas from
//! [`apply_pragmas`] when it is acquired.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema::apply_pragmas;
use super::wrapper::{StatementStats, StoreError};

/// A SQLite database file behind a connection pool.
///
/// Cheap to clone; clones share the pool and the statement counters.
#[derive(Clone)]
pub struct Database {
    path: PathBuf,
    pool: Pool<SqliteConnectionManager>,
    stats: Arc<StatementStats>,
}

impl Database {
    /// Open (creating if needed) the database at `db_path`.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    pub fn open<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, StoreError> {
        let path = db_path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(PragmaCustomizer))
            .build(manager)?;

        tracing::debug!(path = %path.display(), max_size, "Database pool opened");

        Ok(Self {
            path,
            pool,
            stats: Arc::new(StatementStats::new()),
        })
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Statement counters shared by every wrapper created for this database.
    pub fn stats(&self) -> &Arc<StatementStats> {
        &self.stats
    }

    /// Get the current pool state for monitoring.
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }
}

/// Connection customizer that applies pragmas.
#[derive(Debug)]
struct PragmaCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas(conn)
    }
}
