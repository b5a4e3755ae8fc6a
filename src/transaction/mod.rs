//! Asynchronous transactions.
//!
//! Work submitted through a [`TransactionQueue`] runs on the dedicated
//! thread owned by a [`TransactionExecutor`], inside a SQLite transaction
//! that commits when the work returns `Ok` and rolls back otherwise. Each
//! submission yields a [`Transaction`] handle whose single outcome is read
//! through [`Single`] or [`Maybe`].
//!
//! Lifecycle of a transaction:
//!
//! ```text
//! Pending -> Running -> Completed | Failed
//! Pending -> Cancelled
//! Pending -> Failed            (queue full or executor gone)
//! ```

mod executor;
mod handle;
mod subscription;

pub use executor::{TransactionExecutor, TransactionQueue};
pub use handle::Transaction;
pub use subscription::{Disposable, Maybe, Single};

use thiserror::Error;

use crate::storage::StoreError;

/// Error delivered through a transaction's error channel.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transaction was cancelled")]
    Cancelled,

    #[error("Transaction queue is full")]
    QueueFull,

    #[error("Transaction executor has shut down")]
    ExecutorClosed,

    #[error("Transaction work panicked")]
    WorkerPanicked,

    #[error("Failed to spawn executor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Queued, not yet picked up by the executor.
    Pending,
    /// Work is executing.
    Running,
    /// Work returned a value and the transaction committed.
    Completed,
    /// Work, commit, or submission failed.
    Failed,
    /// Cancelled before the executor started it.
    Cancelled,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}
