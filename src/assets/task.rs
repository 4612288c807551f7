//! Cooperative load tasks.
//!
//! Slow work (file reads, image decode, model parsing) runs off the render
//! thread; its result comes back through a `flume` channel. The render loop
//! never awaits: it calls [`LoadTask::poll`] once per frame and picks the
//! result up on whichever frame it has arrived.
//!
//! Dropping a [`LoadTask`] abandons the load. The background side notices the
//! closed channel when it tries to deliver and discards the result, so a load
//! that resolves after its effect was disposed touches nothing.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use flume::TryRecvError;
use futures::channel::oneshot;

use crate::errors::{Error, Result};

/// Handle to a result that will be produced on a later frame.
#[must_use = "dropping a LoadTask abandons the load"]
pub struct LoadTask<T> {
    label: String,
    receiver: Option<flume::Receiver<Result<T>>>,
}

impl<T> LoadTask<T> {
    /// Creates a task and the sender its producer must fulfil.
    pub(crate) fn channel(label: impl Into<String>) -> (flume::Sender<Result<T>>, Self) {
        let (tx, rx) = flume::bounded(1);
        (
            tx,
            Self {
                label: label.into(),
                receiver: Some(rx),
            },
        )
    }

    /// A task whose result is already known (it is still delivered through
    /// [`poll`](Self::poll), never synchronously).
    pub fn resolved(label: impl Into<String>, result: Result<T>) -> Self {
        let (tx, task) = Self::channel(label);
        let _ = tx.send(result);
        task
    }

    /// Non-blocking check for the result. Yields it exactly once.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let receiver = self.receiver.as_ref()?;
        let outcome = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(Error::asset_load(
                self.label.clone(),
                "loader task ended without producing a result",
            )),
        };
        self.receiver = None;
        Some(outcome)
    }
}

// ============================================================================
// Load completion (caller-facing future)
// ============================================================================

/// Future handed to whoever requested a load; resolves when the effect has
/// finished building its content, rejects with the load error otherwise.
///
/// If the effect is disposed before completion the future resolves to
/// [`Error::Cancelled`].
#[must_use = "a LoadCompletion does nothing unless polled or awaited"]
pub struct LoadCompletion {
    receiver: oneshot::Receiver<Result<()>>,
}

/// Producer side of a [`LoadCompletion`].
pub struct LoadCompleter {
    sender: Option<oneshot::Sender<Result<()>>>,
}

impl LoadCompletion {
    pub fn pair() -> (LoadCompleter, LoadCompletion) {
        let (tx, rx) = oneshot::channel();
        (LoadCompleter { sender: Some(tx) }, LoadCompletion { receiver: rx })
    }
}

impl Future for LoadCompletion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(Error::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl LoadCompleter {
    /// Settles the completion. Later calls are ignored.
    pub fn complete(&mut self, result: Result<()>) {
        if let Some(tx) = self.sender.take() {
            // The requester may have dropped its future; that is fine.
            let _ = tx.send(result);
        }
    }
}
