use crate::CancellationToken;
use crate::combinator::{WithCancellation, with_cancellation};
use crate::utils::Slab;

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// An asynchronous, fair mutex.
///
/// Tasks that cannot take the lock are suspended and queued. On release the
/// lock is handed directly to the oldest waiter, so acquisitions complete in
/// arrival order and a late arrival can never overtake a queued one.
pub struct Mutex<T> {
    state: parking_lot::Mutex<State>,
    data: UnsafeCell<T>,
}

struct State {
    locked: bool,
    waiters: Slab<Waiter>,
    /// Keys into `waiters`, oldest first.
    queue: VecDeque<usize>,
}

struct Waiter {
    waker: Option<Waker>,
    /// Set by the releasing side when ownership was handed to this waiter.
    granted: bool,
}

// SAFETY: access to `data` is serialized by the lock protocol.
unsafe impl<T: Send> Send for Mutex<T> {}
// SAFETY: see above; only one guard exists at a time.
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: parking_lot::Mutex::new(State {
                locked: false,
                waiters: Slab::new(),
                queue: VecDeque::new(),
            }),
            data: UnsafeCell::new(value),
        }
    }

    /// Resolves to a guard once the lock is acquired.
    pub fn lock(&self) -> Lock<'_, T> {
        Lock {
            mutex: self,
            key: None,
            done: false,
        }
    }

    /// Like [`lock`](Self::lock), but the guard keeps the mutex alive and
    /// carries no borrow.
    pub fn lock_owned(self: &Arc<Self>) -> OwnedLock<T> {
        OwnedLock {
            mutex: Some(self.clone()),
            key: None,
        }
    }

    /// Like [`lock`](Self::lock), giving up with [`Error::Cancelled`] when
    /// `token` fires first. A cancelled waiter leaves the queue.
    ///
    /// [`Error::Cancelled`]: crate::Error::Cancelled
    pub fn lock_cancellable(&self, token: &CancellationToken) -> WithCancellation<Lock<'_, T>> {
        with_cancellation(self.lock(), token)
    }

    /// Takes the lock only if it is free and nobody is queued.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        let mut state = self.state.lock();

        if state.locked || !state.queue.is_empty() {
            return None;
        }

        state.locked = true;
        Some(MutexGuard { mutex: self })
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn poll_acquire(&self, key: &mut Option<usize>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.lock();

        let Some(k) = *key else {
            if !state.locked && state.queue.is_empty() {
                state.locked = true;
                return Poll::Ready(());
            }

            let k = state.waiters.insert(Waiter {
                waker: Some(cx.waker().clone()),
                granted: false,
            });
            state.queue.push_back(k);
            *key = Some(k);

            return Poll::Pending;
        };

        let Some(waiter) = state.waiters.get_mut(k) else {
            unreachable!("queued lock waiter vanished");
        };

        if waiter.granted {
            state.waiters.remove(k);
            *key = None;
            return Poll::Ready(());
        }

        if !waiter
            .waker
            .as_ref()
            .is_some_and(|waker| waker.will_wake(cx.waker()))
        {
            waiter.waker = Some(cx.waker().clone());
        }

        Poll::Pending
    }

    /// Withdraws a queued waiter whose future is being dropped.
    fn abandon(&self, key: usize) {
        let mut state = self.state.lock();

        let Some(waiter) = state.waiters.remove(key) else {
            return;
        };

        if waiter.granted {
            // Ownership arrived but was never observed; pass it on.
            drop(state);
            self.release();
            return;
        }

        if let Some(pos) = state.queue.iter().position(|&k| k == key) {
            state.queue.remove(pos);
        }
    }

    fn release(&self) {
        let waker = {
            let mut state = self.state.lock();

            match state.queue.pop_front() {
                Some(next) => {
                    let waiter = state
                        .waiters
                        .get_mut(next)
                        .expect("queue and waiters out of sync");
                    waiter.granted = true;
                    waiter.waker.take()
                }
                None => {
                    state.locked = false;
                    None
                }
            }
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Mutex")
            .field("locked", &state.locked)
            .field("queued", &state.queue.len())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Mutex::lock`].
#[must_use = "futures do nothing unless polled"]
pub struct Lock<'a, T> {
    mutex: &'a Mutex<T>,
    key: Option<usize>,
    done: bool,
}

impl<'a, T> Future for Lock<'a, T> {
    type Output = MutexGuard<'a, T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.done, "`Lock` polled after completion");

        match this.mutex.poll_acquire(&mut this.key, cx) {
            Poll::Ready(()) => {
                this.done = true;
                Poll::Ready(MutexGuard { mutex: this.mutex })
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for Lock<'_, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.mutex.abandon(key);
        }
    }
}

/// Future returned by [`Mutex::lock_owned`].
#[must_use = "futures do nothing unless polled"]
pub struct OwnedLock<T> {
    /// Taken when the guard is handed out.
    mutex: Option<Arc<Mutex<T>>>,
    key: Option<usize>,
}

impl<T> Future for OwnedLock<T> {
    type Output = OwnedMutexGuard<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mutex = this
            .mutex
            .as_ref()
            .expect("`OwnedLock` polled after completion");

        match mutex.poll_acquire(&mut this.key, cx) {
            Poll::Ready(()) => match this.mutex.take() {
                Some(mutex) => Poll::Ready(OwnedMutexGuard { mutex }),
                None => unreachable!(),
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for OwnedLock<T> {
    fn drop(&mut self) {
        if let (Some(mutex), Some(key)) = (&self.mutex, self.key) {
            mutex.abandon(key);
        }
    }
}

/// Releases the mutex when dropped, handing it to the next waiter.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

// SAFETY: the guard only hands out `&T` across threads.
unsafe impl<T: Sync> Sync for MutexGuard<'_, T> {}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

/// Owned counterpart of [`MutexGuard`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct OwnedMutexGuard<T> {
    mutex: Arc<Mutex<T>>,
}

// SAFETY: as for `MutexGuard`.
unsafe impl<T: Sync> Sync for OwnedMutexGuard<T> {}

impl<T> OwnedMutexGuard<T> {
    /// The mutex this guard locks.
    pub fn mutex(&self) -> &Arc<Mutex<T>> {
        &self.mutex
    }
}

impl<T> Deref for OwnedMutexGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for OwnedMutexGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for OwnedMutexGuard<T> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}
