//! Worker pool.
//!
//! - [`core`]: owns the worker threads and the shutdown flag.
//! - [`worker`]: the per-thread run loop.

pub(crate) mod core;
pub(crate) mod worker;
