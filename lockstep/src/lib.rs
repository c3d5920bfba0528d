//! # lockstep
//!
//! **lockstep** is a toolkit of asynchronous coordination primitives, shipped
//! together with the small work-stealing runtime that drives them.
//!
//! Nothing in here blocks a thread except where it says so. A task that cannot
//! proceed is suspended until another task or thread performs the releasing
//! action: dropping a handle, setting a value, finishing a queue slot.
//!
//! - [`graph`]: hierarchical read/write locks over a directed acyclic graph,
//!   where locking a vertex also covers everything reachable from it
//! - [`task_source`]: a reusable, generation-checked completion cell and a
//!   zero-buffer rendezvous built on it
//! - [`sync`]: fair async mutex, countdown, barrier, continuation queue
//! - [`combinator`]: fail-fast and fire-and-check joins, timeout probing,
//!   cancellation wrapping
//! - [`time`]: sleep and timeout on the runtime's timer thread
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lockstep::CancellationToken;
//! use lockstep::graph::LockGraph;
//! use std::sync::Arc;
//!
//! #[lockstep::main]
//! async fn main() -> lockstep::Result<()> {
//!     let mut graph = LockGraph::new();
//!     let root = graph.add_vertex();
//!     let leaf = graph.add_vertex();
//!     graph.add_edges(root, &[leaf])?;
//!     graph.validate_all()?;
//!
//!     let graph = Arc::new(graph);
//!     let token = CancellationToken::none();
//!
//!     // Writing the root also keeps writers off the leaf.
//!     let guard = graph.write_lock(root, &token).await?;
//!     drop(guard);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime
//!
//! [`RuntimeBuilder`] configures the worker count; `#[lockstep::main]` and
//! `#[lockstep::test]` wrap an `async fn` in a fresh runtime. [`task::spawn`]
//! places a future on the current runtime, [`join!`] and [`select!`] combine
//! futures inside one task.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (mostly `trace`, `warn` for blocking
//! calls made from worker threads) and never installs a subscriber.

mod reactor;
mod runtime;
mod utils;

pub mod cancel;
pub mod combinator;
pub mod error;
pub mod graph;
pub mod helpers;
pub mod sync;
pub mod task_source;
pub mod time;

pub use cancel::CancellationToken;
pub use error::{BoxError, Error, Result};

pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use lockstep_macros::*;
