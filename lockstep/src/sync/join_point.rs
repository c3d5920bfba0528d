use crate::utils::Slab;

use parking_lot::Mutex;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A one-shot event any number of tasks can wait on.
///
/// Once completed it stays completed; waiters registered before that are
/// woken together, later ones resolve on their first poll.
pub(crate) struct JoinPoint {
    completed: AtomicBool,
    waiters: Mutex<Slab<Waker>>,
}

impl JoinPoint {
    pub(crate) const fn new() -> Self {
        Self {
            completed: AtomicBool::new(false),
            waiters: Mutex::new(Slab::new()),
        }
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Completes the join point. Returns `false` if it was already complete.
    pub(crate) fn complete(&self) -> bool {
        let wakers: Vec<Waker> = {
            let mut waiters = self.waiters.lock();

            if self.completed.swap(true, Ordering::AcqRel) {
                return false;
            }

            waiters.drain().collect()
        };

        for waker in wakers {
            waker.wake();
        }

        true
    }

    fn poll_wait(&self, key: &mut Option<usize>, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_completed() {
            *key = None;
            return Poll::Ready(());
        }

        let mut waiters = self.waiters.lock();

        // Re-checked under the lock: `complete` flips the flag while holding it.
        if self.is_completed() {
            *key = None;
            return Poll::Ready(());
        }

        match key.and_then(|k| waiters.get_mut(k)) {
            Some(waker) => {
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
            }
            None => *key = Some(waiters.insert(cx.waker().clone())),
        }

        Poll::Pending
    }

    fn unregister(&self, key: usize) {
        let mut waiters = self.waiters.lock();

        if !self.is_completed() {
            waiters.remove(key);
        }
    }
}

/// Future resolving once a barrier phase, a queue slot or a cancellation
/// token completes.
#[must_use = "futures do nothing unless polled"]
pub struct Wait {
    point: Option<Arc<JoinPoint>>,
    key: Option<usize>,
}

impl Wait {
    pub(crate) fn new(point: Arc<JoinPoint>) -> Self {
        Self {
            point: Some(point),
            key: None,
        }
    }

    /// A wait that is already satisfied.
    pub(crate) fn finished() -> Self {
        Self {
            point: None,
            key: None,
        }
    }

    /// Returns `true` once awaiting would resolve immediately.
    pub fn is_finished(&self) -> bool {
        self.point.as_ref().is_none_or(|point| point.is_completed())
    }
}

impl Future for Wait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        match &this.point {
            Some(point) => point.poll_wait(&mut this.key, cx),
            None => Poll::Ready(()),
        }
    }
}

impl Drop for Wait {
    fn drop(&mut self) {
        if let (Some(point), Some(key)) = (&self.point, self.key) {
            point.unregister(key);
        }
    }
}

impl std::fmt::Debug for Wait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wait")
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{JoinPoint, Wait};

    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll, Wake, Waker};

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_waker() -> (Arc<CountingWaker>, Waker) {
        let inner = Arc::new(CountingWaker(AtomicUsize::new(0)));
        (inner.clone(), Waker::from(inner))
    }

    #[test]
    fn completing_wakes_every_registered_waiter() {
        let point = Arc::new(JoinPoint::new());
        let (count, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);

        let mut first = Wait::new(point.clone());
        let mut second = Wait::new(point.clone());

        assert!(Pin::new(&mut first).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut second).poll(&mut cx).is_pending());

        assert!(point.complete());
        assert!(!point.complete());
        assert_eq!(count.0.load(Ordering::SeqCst), 2);

        assert_eq!(Pin::new(&mut first).poll(&mut cx), Poll::Ready(()));
        assert!(second.is_finished());
    }

    #[test]
    fn dropped_waiter_is_not_woken() {
        let point = Arc::new(JoinPoint::new());
        let (count, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);

        let mut wait = Wait::new(point.clone());
        assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());
        drop(wait);

        point.complete();
        assert_eq!(count.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn finished_wait_is_ready_without_a_point() {
        let (_, waker) = counting_waker();
        let mut cx = Context::from_waker(&waker);

        let mut wait = Wait::finished();
        assert!(wait.is_finished());
        assert_eq!(Pin::new(&mut wait).poll(&mut cx), Poll::Ready(()));
    }
}
