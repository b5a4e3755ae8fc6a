//! Transaction handles and their shared lifecycle state.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::subscription::{Maybe, Single};
use super::{TransactionError, TransactionState};

/// Result channel from the executor to the handle.
pub(crate) type Reply<R> = oneshot::Sender<Result<R, TransactionError>>;

/// Lifecycle state shared by a handle and its queued work.
#[derive(Debug)]
pub(crate) struct TransactionControl {
    id: u64,
    state: Mutex<TransactionState>,
    token: CancellationToken,
}

impl TransactionControl {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            state: Mutex::new(TransactionState::Pending),
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Pending -> Running. False if the transaction was cancelled first.
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if *state != TransactionState::Pending {
            return false;
        }
        *state = TransactionState::Running;
        true
    }

    /// Running -> Completed or Failed.
    pub(crate) fn finish(&self, succeeded: bool) {
        let mut state = self.state.lock();
        if *state == TransactionState::Running {
            *state = if succeeded {
                TransactionState::Completed
            } else {
                TransactionState::Failed
            };
        }
    }

    /// Pending -> Failed, for work that never reached the executor.
    ///
    /// False if the transaction was already cancelled.
    pub(crate) fn reject(&self) -> bool {
        let mut state = self.state.lock();
        if *state != TransactionState::Pending {
            return false;
        }
        *state = TransactionState::Failed;
        true
    }

    /// Request cancellation.
    ///
    /// A pending transaction becomes `Cancelled` and will be skipped. A
    /// running one is signalled through its token and its result discarded.
    /// Returns false once the transaction is terminal.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            TransactionState::Pending => {
                *state = TransactionState::Cancelled;
                self.token.cancel();
                true
            }
            TransactionState::Running => {
                self.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Error for a result channel that closed without a value.
    pub(crate) fn closed_error(&self) -> TransactionError {
        if self.is_cancelled() || self.state() == TransactionState::Cancelled {
            TransactionError::Cancelled
        } else {
            TransactionError::ExecutorClosed
        }
    }
}

/// Handle to one unit of work submitted with
/// [`begin_transaction_async`](super::TransactionQueue::begin_transaction_async).
///
/// The outcome is read by converting the handle with [`as_single`](Self::as_single)
/// or, for optional results, [`as_maybe`](Transaction::as_maybe).
pub struct Transaction<R> {
    control: Arc<TransactionControl>,
    receiver: oneshot::Receiver<Result<R, TransactionError>>,
}

impl<R> Transaction<R> {
    pub(crate) fn new(
        control: Arc<TransactionControl>,
        receiver: oneshot::Receiver<Result<R, TransactionError>>,
    ) -> Self {
        Self { control, receiver }
    }

    pub fn id(&self) -> u64 {
        self.control.id()
    }

    pub fn state(&self) -> TransactionState {
        self.control.state()
    }

    /// Cancel the transaction. See [`Single`] for what a cancelled
    /// subscriber observes. No-op once terminal.
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    /// Observe exactly one value or one error.
    pub fn as_single(self) -> Single<R> {
        Single::new(self.control, self.receiver)
    }
}

impl<T> Transaction<Option<T>> {
    /// Observe zero or one value, or one error.
    pub fn as_maybe(self) -> Maybe<T> {
        Maybe::new(self.as_single())
    }
}
