//! Test utilities for modelflow integration tests.
//!
//! Provides:
//! - Temporary database fixtures with the `notes` table
//! - An executor harness whose thread can be held busy on demand

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::mpsc;
use tempfile::TempDir;

use modelflow::notes;
use modelflow::storage::Database;
use modelflow::transaction::{Single, TransactionExecutor, TransactionQueue};

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
    /// Pooled database with the `notes` table created
    pub db: Database,
}

impl TestFixture {
    /// Create a new test fixture with a fresh `notes` database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path, 4).expect("failed to open database");
        notes::create_table(&db.get().expect("no connection")).expect("failed to create table");
        Self {
            temp_dir,
            db_path,
            db,
        }
    }

    /// Get the database path as a string.
    pub fn db_path_str(&self) -> &str {
        self.db_path.to_str().expect("invalid path")
    }

    /// Spawn a transaction executor over this fixture's database.
    pub fn executor(&self, queue_size: usize) -> TransactionExecutor {
        TransactionExecutor::spawn(self.db.clone(), queue_size).expect("failed to spawn executor")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the executor thread busy until released.
pub struct Blocker {
    release: mpsc::Sender<()>,
    pub done: Single<()>,
}

impl Blocker {
    /// Submit work that parks the executor thread, and wait until it has started.
    pub fn start(queue: &TransactionQueue) -> Self {
        let (started_tx, started_rx) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<()>();
        let done = queue
            .begin_transaction_async(move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
                Ok(())
            })
            .as_single();
        started_rx.recv().expect("blocking work never started");
        Self { release, done }
    }

    /// Let the executor continue and wait for the blocking work to finish.
    pub async fn release(self) {
        let _ = self.release.send(());
        self.done.await.expect("blocking work failed");
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_notes_table() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path_str().contains("test.db"));
        assert_eq!(notes::count(&fixture.db.get().unwrap()).unwrap(), 0);
    }
}
