use crate::error::{BoxError, Error, Result};

use parking_lot::Mutex;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll, Waker};

/// Completion state of one generation of a [`ReusableValueTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTaskStatus {
    Pending,
    Succeeded,
    Faulted,
    Canceled,
}

impl ValueTaskStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Succeeded,
            2 => Self::Faulted,
            3 => Self::Canceled,
            _ => Self::Pending,
        }
    }

    pub fn is_completed(self) -> bool {
        self != Self::Pending
    }
}

pub(crate) enum Slot<T> {
    Pending,
    Succeeded(T),
    Faulted(BoxError),
    Canceled,
}

impl<T> Slot<T> {
    fn status(&self) -> ValueTaskStatus {
        match self {
            Slot::Pending => ValueTaskStatus::Pending,
            Slot::Succeeded(_) => ValueTaskStatus::Succeeded,
            Slot::Faulted(_) => ValueTaskStatus::Faulted,
            Slot::Canceled => ValueTaskStatus::Canceled,
        }
    }
}

struct Core<T> {
    /// Generation token; bumped, wrapping, each time a result is consumed.
    version: u16,

    /// Outcome of the current generation.
    slot: Slot<T>,

    /// The single continuation, woken outside the lock on completion.
    waker: Option<Waker>,
}

/// A single-slot completion cell that is reset and reused after every
/// consumption.
///
/// Each generation is identified by a `u16` token. Producers and
/// consumers present the token they started with, so a late producer or a
/// copy of an old [`ValueTask`] can never observe or corrupt a newer
/// generation. Consuming the result of the current generation (or trying to
/// consume it early) resets the cell: the token moves on, the status goes
/// back to [`ValueTaskStatus::Pending`], and the slot and waker are
/// cleared.
pub struct ReusableValueTask<T> {
    /// Generation, outcome and continuation, changed together.
    core: Mutex<Core<T>>,

    /// Status of the current generation, readable without the lock.
    status: AtomicU8,
}

impl<T> ReusableValueTask<T> {
    pub const fn new() -> Self {
        Self {
            core: Mutex::new(Core {
                version: 0,
                slot: Slot::Pending,
                waker: None,
            }),
            status: AtomicU8::new(ValueTaskStatus::Pending as u8),
        }
    }

    /// Token of the current generation.
    pub fn version(&self) -> u16 {
        self.core.lock().version
    }

    /// Whether the current generation has an outcome waiting to be read.
    pub fn is_completed(&self) -> bool {
        ValueTaskStatus::from_u8(self.status.load(Ordering::Acquire)).is_completed()
    }

    pub fn status(&self, token: u16) -> Result<ValueTaskStatus> {
        let core = self.core.lock();
        check_token(&core, token)?;
        Ok(core.slot.status())
    }

    /// Takes the outcome of generation `token` and resets the cell.
    ///
    /// A stale token fails with [`Error::InvalidOperation`] and leaves the
    /// current generation alone.
    pub fn get_result(&self, token: u16) -> Result<T> {
        let mut core = self.core.lock();
        check_token(&core, token)?;
        self.consume(&mut core)
    }

    /// Registers `waker` to be woken when generation `token` completes,
    /// replacing any earlier registration. Wakes it right away if the
    /// outcome is already there.
    pub fn on_completed(&self, token: u16, waker: &Waker) -> Result<()> {
        let mut core = self.core.lock();
        check_token(&core, token)?;

        if core.slot.status().is_completed() {
            drop(core);
            waker.wake_by_ref();
        } else {
            register(&mut core.waker, waker);
        }

        Ok(())
    }

    pub fn try_set_result(&self, value: T, token: u16) -> bool {
        self.complete(Some(token), Slot::Succeeded(value))
    }

    pub fn try_set_canceled(&self, token: u16) -> bool {
        self.complete(Some(token), Slot::Canceled)
    }

    pub fn try_set_exception(&self, error: impl Into<BoxError>, token: u16) -> bool {
        self.complete(Some(token), Slot::Faulted(error.into()))
    }

    /// A future for the current generation.
    pub fn task(&self) -> ValueTask<'_, T> {
        ValueTask {
            source: self,
            token: self.version(),
        }
    }

    /// Completes the generation identified by `token`, or whatever
    /// generation is current when `token` is `None`.
    pub(crate) fn complete(&self, token: Option<u16>, slot: Slot<T>) -> bool {
        let waker = {
            let mut core = self.core.lock();

            if token.is_some_and(|token| token != core.version)
                || core.slot.status().is_completed()
            {
                return false;
            }

            let status = slot.status();
            core.slot = slot;
            self.status.store(status as u8, Ordering::Release);

            tracing::trace!(version = core.version, ?status, "value task completed");
            core.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }

        true
    }

    pub(crate) fn poll_result(&self, token: u16, cx: &mut Context<'_>) -> Poll<Result<T>> {
        let mut core = self.core.lock();

        if let Err(err) = check_token(&core, token) {
            return Poll::Ready(Err(err));
        }

        if !core.slot.status().is_completed() {
            register(&mut core.waker, cx.waker());
            return Poll::Pending;
        }

        Poll::Ready(self.consume(&mut core))
    }

    fn consume(&self, core: &mut Core<T>) -> Result<T> {
        let slot = std::mem::replace(&mut core.slot, Slot::Pending);

        core.version = core.version.wrapping_add(1);
        core.waker = None;
        self.status
            .store(ValueTaskStatus::Pending as u8, Ordering::Release);

        match slot {
            Slot::Pending => Err(Error::InvalidOperation("value task has not completed")),
            Slot::Succeeded(value) => Ok(value),
            Slot::Faulted(err) => Err(Error::Faulted(err)),
            Slot::Canceled => Err(Error::Cancelled),
        }
    }
}

fn check_token<T>(core: &Core<T>, token: u16) -> Result<()> {
    if core.version == token {
        Ok(())
    } else {
        Err(Error::InvalidOperation("value task token is stale"))
    }
}

fn register(slot: &mut Option<Waker>, waker: &Waker) {
    if !slot.as_ref().is_some_and(|current| current.will_wake(waker)) {
        *slot = Some(waker.clone());
    }
}

impl<T> Default for ReusableValueTask<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReusableValueTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("ReusableValueTask")
            .field("version", &core.version)
            .field("status", &core.slot.status())
            .finish()
    }
}

/// Future for one generation of a [`ReusableValueTask`].
///
/// It is `Copy`; only the first copy to observe the outcome gets it, the
/// others resolve to [`Error::InvalidOperation`].
#[must_use = "futures do nothing unless polled"]
pub struct ValueTask<'a, T> {
    source: &'a ReusableValueTask<T>,

    /// Generation this future was created for.
    token: u16,
}

impl<T> ValueTask<'_, T> {
    pub fn token(&self) -> u16 {
        self.token
    }

    /// Whether awaiting would resolve without suspending.
    pub fn is_completed(&self) -> bool {
        !matches!(self.source.status(self.token), Ok(ValueTaskStatus::Pending))
    }
}

impl<T> Clone for ValueTask<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ValueTask<'_, T> {}

impl<T> Future for ValueTask<'_, T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.source.poll_result(self.token, cx)
    }
}

impl<T> fmt::Debug for ValueTask<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTask")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
