//! Run queues.
//!
//! - [`injector`]: global FIFO queue, also used to park idle workers.
//! - [`queue`]: per-worker deque, LIFO for its owner, FIFO for thieves.

pub(crate) mod injector;
pub(crate) mod queue;
