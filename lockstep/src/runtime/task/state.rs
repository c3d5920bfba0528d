//! Lifecycle states of a task, stored in `Task::state`.
//!
//! ```text
//! QUEUED -> RUNNING -> IDLE -> QUEUED -> ...
//!              |  \
//!              |   `-> NOTIFIED -> QUEUED   (woken while running)
//!              `-> COMPLETED
//! ```

/// Suspended; a wake moves it back to `QUEUED`.
pub(crate) const IDLE: usize = 0;

/// Sitting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Being polled by exactly one worker.
pub(crate) const RUNNING: usize = 2;

/// The future returned `Ready` (or panicked); it has been dropped.
pub(crate) const COMPLETED: usize = 3;

/// Woken while `RUNNING`; requeued as soon as the poll returns.
pub(crate) const NOTIFIED: usize = 4;
