use crate::CancellationToken;
use crate::error::{Error, Result};
use crate::sync::Wait;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Races `future` against `token`.
///
/// The future is polled first, so an outcome that is already there wins
/// over a cancellation. A token that can never be cancelled is not polled
/// at all.
pub fn with_cancellation<F>(future: F, token: &CancellationToken) -> WithCancellation<F>
where
    F: Future,
{
    WithCancellation {
        future,
        cancelled: token.can_be_cancelled().then(|| token.cancelled()),
    }
}

/// Future returned by [`with_cancellation`].
#[must_use = "futures do nothing unless polled"]
pub struct WithCancellation<F> {
    future: F,
    cancelled: Option<Wait>,
}

impl<F> Future for WithCancellation<F>
where
    F: Future,
{
    type Output = Result<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: `future` is never moved out of the pinned wrapper;
        // `cancelled` is `Unpin`.
        let this = unsafe { self.get_unchecked_mut() };

        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(val) = future.poll(cx) {
            return Poll::Ready(Ok(val));
        }

        if let Some(cancelled) = &mut this.cancelled
            && Pin::new(cancelled).poll(cx).is_ready()
        {
            return Poll::Ready(Err(Error::Cancelled));
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::with_cancellation;
    use crate::CancellationToken;

    use std::future::{Future, pending, ready};
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    #[test]
    fn ready_future_beats_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();

        let mut cx = Context::from_waker(Waker::noop());
        let fut = pin!(with_cancellation(ready(5), &token));

        assert!(matches!(fut.poll(&mut cx), Poll::Ready(Ok(5))));
    }

    #[test]
    fn cancellation_ends_a_pending_future() {
        let token = CancellationToken::new();
        let mut cx = Context::from_waker(Waker::noop());
        let mut fut = pin!(with_cancellation(pending::<()>(), &token));

        assert!(fut.as_mut().poll(&mut cx).is_pending());
        token.cancel();

        let Poll::Ready(Err(err)) = fut.poll(&mut cx) else {
            panic!("expected cancellation");
        };
        assert!(err.is_cancelled());
    }

    #[test]
    fn none_token_is_never_polled() {
        let mut cx = Context::from_waker(Waker::noop());
        let fut = pin!(with_cancellation(pending::<()>(), &CancellationToken::none()));

        assert!(fut.cancelled.is_none());
        assert!(fut.poll(&mut cx).is_pending());
    }
}
