use crate::error::{Error, Result};
use crate::utils::Slab;

use parking_lot::Mutex;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// An asynchronous countdown.
///
/// [`wait`](Self::wait) resolves whenever the count is zero. Unlike a
/// latch the count may go back up with [`add_count`](Self::add_count),
/// which is how reader holds on a graph vertex are tracked.
pub struct CountdownEvent {
    state: Mutex<State>,
}

struct State {
    count: usize,
    waiters: Slab<Waker>,
    /// Bumped on every drain; waiter keys from an older epoch are dead.
    epoch: u64,
}

impl State {
    fn waiter(&mut self, key: Option<(u64, usize)>) -> Option<&mut Waker> {
        match key {
            Some((epoch, key)) if epoch == self.epoch => self.waiters.get_mut(key),
            _ => None,
        }
    }
}

impl CountdownEvent {
    pub const fn new(count: usize) -> Self {
        Self {
            state: Mutex::new(State {
                count,
                waiters: Slab::new(),
                epoch: 0,
            }),
        }
    }

    pub fn count(&self) -> usize {
        self.state.lock().count
    }

    pub fn add_count(&self, n: usize) -> Result<()> {
        let mut state = self.state.lock();

        state.count = state
            .count
            .checked_add(n)
            .ok_or(Error::InvalidOperation("countdown overflow"))?;

        Ok(())
    }

    /// Decrements the count, waking every waiter when it reaches zero.
    pub fn signal(&self) -> Result<()> {
        let wakers: Vec<Waker> = {
            let mut state = self.state.lock();

            if state.count == 0 {
                return Err(Error::InvalidOperation("countdown is already zero"));
            }

            state.count -= 1;
            if state.count > 0 {
                return Ok(());
            }

            state.epoch = state.epoch.wrapping_add(1);
            state.waiters.drain().collect()
        };

        for waker in wakers {
            waker.wake();
        }

        Ok(())
    }

    /// Resolves once the count is observed at zero.
    pub fn wait(&self) -> CountdownWait<'_> {
        CountdownWait {
            event: self,
            key: None,
        }
    }
}

impl fmt::Debug for CountdownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownEvent")
            .field("count", &self.count())
            .finish()
    }
}

/// Future returned by [`CountdownEvent::wait`].
#[must_use = "futures do nothing unless polled"]
pub struct CountdownWait<'a> {
    event: &'a CountdownEvent,
    key: Option<(u64, usize)>,
}

impl Future for CountdownWait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut state = this.event.state.lock();

        if state.count == 0 {
            if let Some((epoch, key)) = this.key.take()
                && epoch == state.epoch
            {
                state.waiters.remove(key);
            }
            return Poll::Ready(());
        }

        // No live slot if a drain happened and the count rose again before
        // this poll.
        match state.waiter(this.key) {
            Some(waker) => {
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
            }
            None => {
                let key = state.waiters.insert(cx.waker().clone());
                this.key = Some((state.epoch, key));
            }
        }

        Poll::Pending
    }
}

impl Drop for CountdownWait<'_> {
    fn drop(&mut self) {
        if let Some((epoch, key)) = self.key {
            let mut state = self.event.state.lock();
            if epoch == state.epoch {
                state.waiters.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CountdownEvent;

    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    #[test]
    fn wait_resolves_at_zero() {
        let event = CountdownEvent::new(0);
        let mut cx = Context::from_waker(Waker::noop());

        assert_eq!(pin!(event.wait()).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn wait_tracks_add_and_signal() {
        let event = CountdownEvent::new(0);
        let mut cx = Context::from_waker(Waker::noop());

        event.add_count(2).unwrap();
        let mut wait = pin!(event.wait());
        assert!(wait.as_mut().poll(&mut cx).is_pending());

        event.signal().unwrap();
        assert!(wait.as_mut().poll(&mut cx).is_pending());

        event.signal().unwrap();
        assert!(wait.as_mut().poll(&mut cx).is_ready());
        assert_eq!(event.count(), 0);
    }

    #[test]
    fn signal_below_zero_is_rejected() {
        let event = CountdownEvent::new(1);

        event.signal().unwrap();
        assert!(event.signal().unwrap_err().is_invalid_operation());
    }
}
