use crate::runtime::task::Task;
use crate::runtime::task::state::COMPLETED;

use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::{Context, Poll};

/// Owned permission to await a spawned task's output.
///
/// Dropping the handle detaches the task; it keeps running.
pub struct JoinHandle<T> {
    pub(crate) task: Arc<Task<T>>,
}

impl<T> JoinHandle<T> {
    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        self.task.state.load(Ordering::Acquire) == COMPLETED
    }

    fn take_output(&self) -> T {
        // SAFETY: `COMPLETED` is published after the result is written and
        // the task never touches the slot again. Only this handle reads it.
        let result = unsafe { (*self.task.result.get()).take() };

        match result {
            Some(Ok(value)) => value,
            Some(Err(payload)) => panic::resume_unwind(payload),
            None => panic!("JoinHandle polled after completion"),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    /// Resolves to the task output, resuming the task's panic if it had
    /// one.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.is_finished() {
            return Poll::Ready(self.take_output());
        }

        {
            let mut waiters = self.task.waiters.lock();
            if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                waiters.push(cx.waker().clone());
            }
        }

        // The task may have completed between the first check and the
        // registration.
        if self.is_finished() {
            return Poll::Ready(self.take_output());
        }

        Poll::Pending
    }
}
