use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pending exactly once, rescheduling itself on the way out.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Gives other tasks a chance to run before the caller continues.
///
/// Tests use it to let freshly spawned lock requests reach their first
/// suspension point.
pub async fn yield_now() {
    YieldOnce { yielded: false }.await
}
