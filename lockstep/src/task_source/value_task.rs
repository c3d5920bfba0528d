use super::reusable::{ReusableValueTask, Slot, ValueTask};
use crate::error::{BoxError, Error, Result};

/// Producer side of a [`ReusableValueTask`].
///
/// Every setter targets the current generation. Once a consumer has taken
/// the outcome the source is ready for the next one; no reallocation is
/// needed between rounds.
#[derive(Debug)]
pub struct ValueTaskCompletionSource<T> {
    /// Producer calls always target its current generation.
    inner: ReusableValueTask<T>,
}

impl<T> ValueTaskCompletionSource<T> {
    pub const fn new() -> Self {
        Self {
            inner: ReusableValueTask::new(),
        }
    }

    pub fn try_set_result(&self, value: T) -> bool {
        self.inner.complete(None, Slot::Succeeded(value))
    }

    /// Completes with `value`; completing twice is an error.
    pub fn set_result(&self, value: T) -> Result<()> {
        ensure_first(self.try_set_result(value))
    }

    pub fn try_set_canceled(&self) -> bool {
        self.inner.complete(None, Slot::Canceled)
    }

    pub fn set_canceled(&self) -> Result<()> {
        ensure_first(self.try_set_canceled())
    }

    pub fn try_set_exception(&self, error: impl Into<BoxError>) -> bool {
        self.inner.complete(None, Slot::Faulted(error.into()))
    }

    pub fn set_exception(&self, error: impl Into<BoxError>) -> Result<()> {
        ensure_first(self.try_set_exception(error))
    }

    /// A future for the current generation.
    pub fn task(&self) -> ValueTask<'_, T> {
        self.inner.task()
    }

    pub fn version(&self) -> u16 {
        self.inner.version()
    }

    pub(crate) fn source(&self) -> &ReusableValueTask<T> {
        &self.inner
    }
}

impl<T> Default for ValueTaskCompletionSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_first(completed: bool) -> Result<()> {
    if completed {
        Ok(())
    } else {
        Err(Error::InvalidOperation("value task is already completed"))
    }
}
