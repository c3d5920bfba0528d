//! Spawning and joining tasks.
//!
//! [`spawn`] places a future on the current runtime and returns a
//! [`JoinHandle`] resolving to its output. The lower-level pieces (task
//! state machine, waker, runnable trait) are internal to the executor.

pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

mod core;

pub(crate) use core::{Runnable, Task};

pub use core::spawn;
pub use handle::JoinHandle;
