//! Dedicated transaction thread.
//!
//! Submissions are queued on a bounded channel and executed one at a time,
//! in submission order, on a single OS thread. Submitting never blocks: a
//! full or closed queue fails the transaction through its error channel.

use rusqlite::Connection;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::handle::{Reply, Transaction, TransactionControl};
use super::TransactionError;
use crate::observability::metrics::record_transaction;
use crate::storage::{Database, DatabaseWrapper, StatementStats, StoreError};

/// Type-erased unit of work waiting in the queue.
trait QueuedWork: Send {
    fn id(&self) -> u64;

    /// Execute against `conn`, delivering the outcome to the handle.
    fn run(self: Box<Self>, conn: &mut Connection, stats: &Arc<StatementStats>);

    /// Fail without executing.
    fn reject(self: Box<Self>, error: TransactionError);
}

struct PendingTransaction<R, F> {
    work: F,
    control: Arc<TransactionControl>,
    reply: Reply<R>,
}

impl<R, F> QueuedWork for PendingTransaction<R, F>
where
    R: Send + 'static,
    F: FnOnce(&DatabaseWrapper<'_>) -> Result<R, StoreError> + Send + 'static,
{
    fn id(&self) -> u64 {
        self.control.id()
    }

    fn run(self: Box<Self>, conn: &mut Connection, stats: &Arc<StatementStats>) {
        let Self {
            work,
            control,
            reply,
        } = *self;
        let id = control.id();

        if !control.begin() {
            tracing::debug!(id, "Transaction cancelled before start, skipping");
            return;
        }

        let start = Instant::now();
        let result = execute(conn, stats, control.token().clone(), work);
        control.finish(result.is_ok());

        let outcome = if result.is_ok() { "completed" } else { "failed" };
        record_transaction(outcome, start.elapsed().as_secs_f64());

        if control.is_cancelled() {
            tracing::debug!(id, outcome, "Transaction cancelled while running, discarding result");
            return;
        }
        if let Err(e) = &result {
            tracing::debug!(id, error = %e, "Transaction failed");
        }
        // Receiver gone means the subscriber detached; nothing to deliver to.
        let _ = reply.send(result);
    }

    fn reject(self: Box<Self>, error: TransactionError) {
        let Self { control, reply, .. } = *self;
        if !control.reject() {
            return;
        }
        tracing::warn!(id = control.id(), error = %error, "Transaction rejected");
        record_transaction("rejected", 0.0);
        let _ = reply.send(Err(error));
    }
}

/// Run `work` inside a SQLite transaction, committing only on success.
fn execute<R, F>(
    conn: &mut Connection,
    stats: &Arc<StatementStats>,
    token: CancellationToken,
    work: F,
) -> Result<R, TransactionError>
where
    F: FnOnce(&DatabaseWrapper<'_>) -> Result<R, StoreError>,
{
    let tx = conn.transaction().map_err(StoreError::from)?;
    let outcome = {
        let wrapper = DatabaseWrapper::with_stats(&tx, Arc::clone(stats)).with_cancellation(token);
        panic::catch_unwind(AssertUnwindSafe(|| work(&wrapper)))
    };

    match outcome {
        Ok(Ok(value)) => {
            tx.commit().map_err(StoreError::from)?;
            Ok(value)
        }
        // Dropping `tx` rolls back.
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(TransactionError::WorkerPanicked),
    }
}

enum Command {
    Run(Box<dyn QueuedWork>),
    Shutdown,
}

impl Command {
    fn reject(self, error: TransactionError) {
        if let Self::Run(work) = self {
            work.reject(error);
        }
    }
}

/// Cloneable submitter for the transaction thread.
#[derive(Clone)]
pub struct TransactionQueue {
    tx: mpsc::Sender<Command>,
    next_id: Arc<AtomicU64>,
}

impl TransactionQueue {
    /// Queue `work` and return its handle immediately.
    ///
    /// The work receives a [`DatabaseWrapper`] over a connection that is
    /// inside a transaction; returning `Err` rolls that transaction back.
    pub fn begin_transaction_async<R, F>(&self, work: F) -> Transaction<R>
    where
        R: Send + 'static,
        F: FnOnce(&DatabaseWrapper<'_>) -> Result<R, StoreError> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let control = Arc::new(TransactionControl::new(id));
        let (reply, receiver) = oneshot::channel();
        let pending = PendingTransaction {
            work,
            control: Arc::clone(&control),
            reply,
        };

        match self.tx.try_send(Command::Run(Box::new(pending))) {
            Ok(()) => tracing::trace!(id, "Transaction queued"),
            Err(TrySendError::Full(command)) => command.reject(TransactionError::QueueFull),
            Err(TrySendError::Closed(command)) => command.reject(TransactionError::ExecutorClosed),
        }

        Transaction::new(control, receiver)
    }

    /// Ask the executor to stop after everything queued before this call.
    pub async fn shutdown(&self) -> Result<(), TransactionError> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| TransactionError::ExecutorClosed)
    }

    /// Whether the executor thread has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owner of the transaction thread.
pub struct TransactionExecutor {
    queue: TransactionQueue,
    thread: JoinHandle<()>,
}

impl TransactionExecutor {
    /// Spawn the transaction thread over `db`.
    ///
    /// # Arguments
    ///
    /// * `db` - Database whose pool supplies a connection per transaction
    /// * `queue_size` - Capacity of the submission queue
    pub fn spawn(db: Database, queue_size: usize) -> Result<Self, TransactionError> {
        let (tx, rx) = mpsc::channel(queue_size.max(1));

        let thread = std::thread::Builder::new()
            .name("modelflow-transactions".to_string())
            .spawn(move || run_executor(db, rx))?;

        Ok(Self {
            queue: TransactionQueue {
                tx,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            thread,
        })
    }

    /// Get a submitter for this executor.
    pub fn queue(&self) -> TransactionQueue {
        self.queue.clone()
    }

    /// Wait for the thread to exit.
    ///
    /// The thread exits after a [`TransactionQueue::shutdown`] or once every
    /// queue clone has been dropped. Blocks the calling thread.
    pub fn join(self) -> Result<(), TransactionError> {
        let Self { queue, thread } = self;
        drop(queue);
        thread.join().map_err(|_| TransactionError::WorkerPanicked)
    }
}

fn run_executor(db: Database, mut rx: mpsc::Receiver<Command>) {
    tracing::info!(path = %db.path().display(), "Transaction executor started");

    while let Some(command) = rx.blocking_recv() {
        let work = match command {
            Command::Run(work) => work,
            Command::Shutdown => break,
        };

        match db.get() {
            Ok(mut conn) => work.run(&mut conn, db.stats()),
            Err(e) => {
                tracing::error!(id = work.id(), error = %e, "No connection for transaction");
                work.reject(e.into());
            }
        }
    }

    // Anything still queued after shutdown fails instead of hanging.
    rx.close();
    while let Ok(command) = rx.try_recv() {
        command.reject(TransactionError::ExecutorClosed);
    }

    tracing::info!("Transaction executor stopped");
}
