use super::JoinHandle;
use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::context::{CURRENT_INJECTOR, CURRENT_LOCALS, CURRENT_WORKER_ID};
use crate::runtime::task::waker::make_waker;
use crate::runtime::work_stealing::injector::Injector;

use parking_lot::Mutex;

use std::any::Any;
use std::cell::UnsafeCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

/// Type-erased entry point used by the run queues.
pub(crate) trait Runnable: Send + Sync {
    fn run(self: Arc<Self>);
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Either the task output or the payload of the panic that ended it.
pub(crate) type TaskResult<T> = Result<T, Box<dyn Any + Send>>;

/// A spawned future together with its scheduling state.
pub(crate) struct Task<T> {
    /// `None` once the future completed; dropping it early releases
    /// whatever the future was holding (lock handles, containers, ...).
    future: UnsafeCell<Option<BoxFuture<T>>>,

    pub(crate) result: UnsafeCell<Option<TaskResult<T>>>,

    /// One of the constants in [`super::state`].
    pub(crate) state: AtomicUsize,

    injector: Arc<Injector>,

    /// Wakers of `JoinHandle`s waiting for the output.
    pub(crate) waiters: Mutex<Vec<Waker>>,
}

// SAFETY: the `UnsafeCell`s are only accessed by the worker that moved the
// task into `RUNNING` (future, result write) or by the `JoinHandle` after
// `COMPLETED` (result read).
unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    pub(crate) fn new<F>(future: F, injector: Arc<Injector>) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: UnsafeCell::new(Some(Box::pin(future))),
            result: UnsafeCell::new(None),
            state: AtomicUsize::new(QUEUED),
            injector,
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Polls the future once.
    ///
    /// A panic raised by the future is captured as the task result so the
    /// worker thread survives it.
    pub(crate) fn run(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return;
        }

        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        // SAFETY: `RUNNING` grants exclusive access to the future.
        let slot = unsafe { &mut *self.future.get() };
        let Some(future) = slot.as_mut() else {
            return;
        };

        let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        let output = match poll {
            Ok(Poll::Pending) => {
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Woken during the poll.
                    self.state.store(QUEUED, Ordering::Release);
                    self.injector.push(self.clone());
                }
                return;
            }
            Ok(Poll::Ready(value)) => Ok(value),
            Err(payload) => {
                tracing::debug!("task panicked");
                Err(payload)
            }
        };

        *slot = None;

        // SAFETY: still `RUNNING`; the handle only reads after `COMPLETED`.
        unsafe {
            *self.result.get() = Some(output);
        }
        self.state.store(COMPLETED, Ordering::Release);

        let waiters = std::mem::take(&mut *self.waiters.lock());
        for waker in waiters {
            waker.wake();
        }
    }

    /// Requeues the task after a wake-up.
    ///
    /// An idle task goes back to the injector; a running one is marked
    /// `NOTIFIED` so the worker requeues it when the current poll returns.
    pub(crate) fn schedule(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }
}

/// Spawns a future onto the runtime the caller is running on.
///
/// From a worker thread the task goes to that worker's local queue;
/// otherwise it is pushed to the global injector.
///
/// # Panics
///
/// Panics if called outside of a runtime.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let injector = CURRENT_INJECTOR.with(|cell| {
        cell.borrow()
            .as_ref()
            .expect("spawn must be called within the context of a runtime")
            .clone()
    });

    let task = Arc::new(Task::new(future, injector.clone()));

    let worker = CURRENT_WORKER_ID.with(|id| *id.borrow());
    let pushed_locally = worker.is_some_and(|id| {
        CURRENT_LOCALS.with(|locals| match locals.borrow().as_ref() {
            Some(locals) => {
                locals[id].push(task.clone());
                true
            }
            None => false,
        })
    });

    if !pushed_locally {
        injector.push(task.clone());
    }

    JoinHandle { task }
}
