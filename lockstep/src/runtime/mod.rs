//! The executor that drives every future in this crate.
//!
//! A fixed pool of worker threads runs tasks from per-worker queues, falling
//! back to a global injector and to stealing from siblings. A separate
//! reactor thread owns timers. Users reach it through [`RuntimeBuilder`],
//! [`Runtime::block_on`] and [`task::spawn`].
//!
//! [`RuntimeBuilder`]: builder::RuntimeBuilder

mod core;
mod executor;
mod work_stealing;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use core::Runtime;
