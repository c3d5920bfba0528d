//! Timers backed by the runtime reactor.
//!
//! - [`sleep`] / [`sleep_until`] complete once a deadline passes.
//! - [`timeout`] bounds another future.

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep, sleep_until};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
