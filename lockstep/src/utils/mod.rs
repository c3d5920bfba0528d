//! Internal helpers shared by the runtime and the synchronization
//! primitives.
//!
//! - [`Slab`] gives waiter queues stable, reusable keys.
//! - [`park`] drives a single future to completion on the calling thread.

mod slab;

pub(crate) mod park;

pub(crate) use slab::Slab;
