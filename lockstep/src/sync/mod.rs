//! Asynchronous synchronization primitives.
//!
//! None of these block a thread: a task that cannot proceed is suspended
//! and woken by whichever call releases it. Wakers are always invoked after
//! the primitive's internal lock is dropped.
//!
//! - [`Mutex`]: fair async mutex with FIFO hand-off.
//! - [`CountdownEvent`]: count that can be awaited down to zero.
//! - [`SinglePhaseBarrier`]: reusable N-participant rendezvous.
//! - [`ContinuationQueue`]: releases waiters one per signal, oldest first.

mod barrier;
mod continuation;
mod countdown;
mod mutex;

pub(crate) mod join_point;

pub use barrier::{BarrierWait, SinglePhaseBarrier};
pub use continuation::ContinuationQueue;
pub use countdown::{CountdownEvent, CountdownWait};
pub use join_point::Wait;
pub use mutex::{Lock, Mutex, MutexGuard, OwnedLock, OwnedMutexGuard};
