use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

/// Polls a future exactly once from inside the frame loop.
///
/// The host wakes us every frame anyway, so the waker is a no-op.
pub fn poll_once<F: Future + Unpin + ?Sized>(future: &mut F) -> Option<F::Output> {
    let mut cx = Context::from_waker(noop_waker_ref());
    match Pin::new(future).poll(&mut cx) {
        Poll::Ready(output) => Some(output),
        Poll::Pending => None,
    }
}
