//! Combinators over groups of futures.
//!
//! Argument checks happen when the combinator is built, so invalid input
//! is reported before anything is polled.

mod all_or_error;
mod cancellation;
mod check;
mod timeout;

pub use all_or_error::{WhenAllOrError, when_all_or_error};
pub use cancellation::{WithCancellation, with_cancellation};
pub use check::{WaitAllButCheck, wait_all_tasks_but_check};
pub use timeout::try_execute_with_timeout;
