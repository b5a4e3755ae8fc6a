//! Single-result subscription contracts over transaction handles.
//!
//! [`Single`] yields exactly one value or one error; [`Maybe`] yields zero
//! or one value, or one error. Both can be awaited, blocked on, or given
//! listeners with `subscribe`.
//!
//! Delivery threads:
//! - awaiting resolves on the task doing the awaiting
//! - `blocking_get` returns on the calling thread
//! - `subscribe` listeners run on a Tokio task spawned on the current runtime
//!
//! Dropping an unresolved `Single`/`Maybe`, or disposing a subscription,
//! cancels the transaction: pending work never runs, and the result of
//! running work is discarded.

use futures::future::FusedFuture;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::handle::TransactionControl;
use super::{TransactionError, TransactionState};

/// Exactly one value or one error.
#[must_use = "dropping a Single cancels its transaction"]
pub struct Single<R> {
    control: Arc<TransactionControl>,
    receiver: oneshot::Receiver<Result<R, TransactionError>>,
    done: bool,
}

impl<R> Single<R> {
    pub(crate) fn new(
        control: Arc<TransactionControl>,
        receiver: oneshot::Receiver<Result<R, TransactionError>>,
    ) -> Self {
        Self {
            control,
            receiver,
            done: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.control.id()
    }

    pub fn state(&self) -> TransactionState {
        self.control.state()
    }

    /// Cancel without detaching; awaiting then yields
    /// [`TransactionError::Cancelled`] unless the outcome already arrived.
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    /// Block the current thread until the outcome arrives.
    ///
    /// Must not be called from async code.
    pub fn blocking_get(self) -> Result<R, TransactionError> {
        futures::executor::block_on(self)
    }
}

impl<R: Send + 'static> Single<R> {
    /// Deliver the outcome to listeners on a spawned Tokio task.
    ///
    /// Exactly one of `on_success` or `on_error` runs, unless the returned
    /// [`Disposable`] is disposed first, in which case neither runs.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe<S, E>(self, on_success: S, on_error: E) -> Disposable
    where
        S: FnOnce(R) + Send + 'static,
        E: FnOnce(TransactionError) + Send + 'static,
    {
        let control = Arc::clone(&self.control);
        Disposable::spawn(control, self, move |result| match result {
            Ok(value) => on_success(value),
            Err(e) => on_error(e),
        })
    }
}

impl<R> Future for Single<R> {
    type Output = Result<R, TransactionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let received = ready!(Pin::new(&mut self.receiver).poll(cx));
        self.done = true;
        Poll::Ready(match received {
            Ok(result) => result,
            Err(_) => Err(self.control.closed_error()),
        })
    }
}

impl<R> FusedFuture for Single<R> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<R> Drop for Single<R> {
    fn drop(&mut self) {
        if !self.done && self.control.cancel() {
            tracing::debug!(id = self.control.id(), "Subscriber detached, transaction cancelled");
        }
    }
}

/// Zero or one value, or one error.
///
/// Resolves to `Ok(None)` when the work returned `None`.
#[must_use = "dropping a Maybe cancels its transaction"]
pub struct Maybe<T> {
    inner: Single<Option<T>>,
}

impl<T> Maybe<T> {
    pub(crate) fn new(inner: Single<Option<T>>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state()
    }

    pub fn cancel(&self) -> bool {
        self.inner.cancel()
    }

    /// Block the current thread until the outcome arrives.
    ///
    /// Must not be called from async code.
    pub fn blocking_get(self) -> Result<Option<T>, TransactionError> {
        futures::executor::block_on(self)
    }
}

impl<T: Send + 'static> Maybe<T> {
    /// Deliver the outcome to listeners on a spawned Tokio task.
    ///
    /// A value runs `on_success`, an empty result runs `on_complete`, and a
    /// failure runs `on_error`; exactly one of them, unless disposed first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe<S, C, E>(self, on_success: S, on_complete: C, on_error: E) -> Disposable
    where
        S: FnOnce(T) + Send + 'static,
        C: FnOnce() + Send + 'static,
        E: FnOnce(TransactionError) + Send + 'static,
    {
        let control = Arc::clone(&self.inner.control);
        Disposable::spawn(control, self, move |result| match result {
            Ok(Some(value)) => on_success(value),
            Ok(None) => on_complete(),
            Err(e) => on_error(e),
        })
    }
}

impl<T> Future for Maybe<T> {
    type Output = Result<Option<T>, TransactionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl<T> FusedFuture for Maybe<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

/// Handle to a listener subscription.
///
/// Dropping it leaves the subscription running; call
/// [`dispose`](Self::dispose) to detach.
pub struct Disposable {
    control: Arc<TransactionControl>,
    detach: CancellationToken,
}

impl Disposable {
    fn spawn<F, D>(control: Arc<TransactionControl>, future: F, deliver: D) -> Self
    where
        F: Future + Send + 'static,
        D: FnOnce(F::Output) + Send + 'static,
    {
        let detach = CancellationToken::new();
        let detached = detach.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = detached.cancelled() => {}
                output = future => deliver(output),
            }
        });
        Self { control, detach }
    }

    /// Detach the listeners and cancel the transaction if it is unfinished.
    ///
    /// No listener runs after this returns, unless one was already running.
    pub fn dispose(&self) {
        self.detach.cancel();
        self.control.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.detach.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    type Parts<R> = (Arc<TransactionControl>, oneshot::Sender<Result<R, TransactionError>>, Single<R>);

    fn single<R>(id: u64) -> Parts<R> {
        let control = Arc::new(TransactionControl::new(id));
        let (tx, rx) = oneshot::channel();
        let single = Single::new(Arc::clone(&control), rx);
        (control, tx, single)
    }

    #[test]
    fn test_single_pending_until_reply() {
        let (control, tx, single) = single::<i64>(1);
        let mut fut = task::spawn(single);
        assert_pending!(fut.poll());

        assert!(control.begin());
        control.finish(true);
        tx.send(Ok(2)).unwrap();

        assert!(fut.is_woken());
        assert_eq!(assert_ready!(fut.poll()).unwrap(), 2);
    }

    #[test]
    fn test_drop_unresolved_cancels() {
        let (control, _tx, single) = single::<()>(1);
        drop(single);
        assert_eq!(control.state(), TransactionState::Cancelled);
    }

    #[test]
    fn test_drop_after_resolve_keeps_state() {
        let (control, tx, single) = single::<()>(1);
        control.begin();
        control.finish(true);
        tx.send(Ok(())).unwrap();

        assert!(single.blocking_get().is_ok());
        assert_eq!(control.state(), TransactionState::Completed);
        assert!(!control.is_cancelled());
    }

    #[test]
    fn test_closed_channel_after_cancel_is_cancelled() {
        let (_control, tx, single) = single::<()>(1);
        assert!(single.cancel());
        drop(tx);
        assert!(matches!(single.blocking_get(), Err(TransactionError::Cancelled)));
    }

    #[test]
    fn test_maybe_empty_resolves_none() {
        let (_control, tx, single) = single::<Option<u8>>(1);
        let maybe = Maybe::new(single);
        tx.send(Ok(None)).unwrap();
        assert_eq!(maybe.blocking_get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_dispose_detaches_listeners() {
        let (control, tx, single) = single::<i64>(1);
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
        let on_error = events_tx.clone();
        let subscription = single.subscribe(
            move |v| {
                let _ = events_tx.send(Ok(v));
            },
            move |e| {
                let _ = on_error.send(Err(e.to_string()));
            },
        );

        subscription.dispose();
        assert!(subscription.is_disposed());
        assert_eq!(control.state(), TransactionState::Cancelled);

        // The executor would not reply to a cancelled transaction; even if it did,
        // nothing is delivered.
        let _ = tx.send(Ok(1));
        assert!(events_rx.recv().await.is_none());
    }
}
