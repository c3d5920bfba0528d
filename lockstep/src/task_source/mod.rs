//! Completion sources: the producer halves of awaitable values.
//!
//! - [`ReusableValueTask`] is a single-slot completion cell that resets
//!   itself after every consumption, guarded by a generation token.
//! - [`ValueTaskCompletionSource`] is its producer-facing wrapper.
//! - [`RechargeableCompletionSource`] is a rendezvous built on two of
//!   them: the producer waits until the consumer releases the
//!   [`ResultContainer`] it was handed.

mod container;
mod rechargeable;
mod reusable;
mod value_task;

pub use container::ResultContainer;
pub use rechargeable::{GetValue, RechargeableCompletionSource};
pub use reusable::{ReusableValueTask, ValueTask, ValueTaskStatus};
pub use value_task::ValueTaskCompletionSource;
