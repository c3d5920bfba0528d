//! Timer reactor.
//!
//! The reactor runs on its own thread and owns every pending timer. Tasks
//! never touch the timer heap directly: they send [`Command`]s through a
//! [`ReactorHandle`] and are woken through their [`Waker`](std::task::Waker)
//! once the deadline passes.
//!
//! The lock and rendezvous primitives never need the reactor; it exists for
//! [`sleep`](crate::time::sleep), [`timeout`](crate::time::timeout) and the
//! timed combinators built on them.

mod core;
mod timer;

pub(crate) mod command;

pub(crate) use core::{Reactor, ReactorHandle};
