use super::command::Command;
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::thread;
use std::time::Instant;

/// Sending half used by tasks to talk to the reactor thread.
pub(crate) type ReactorHandle = Sender<Command>;

/// The timer loop.
///
/// The reactor blocks on its command channel, using the earliest pending
/// deadline as the receive timeout, then fires every timer that expired.
pub(crate) struct Reactor {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    /// Spawns the reactor thread and returns a handle to it.
    ///
    /// The thread exits on [`Command::Shutdown`] or once every handle has
    /// been dropped.
    pub(crate) fn start() -> ReactorHandle {
        let (handle, receiver) = channel();

        thread::Builder::new()
            .name("lockstep-reactor".into())
            .spawn(move || {
                Reactor {
                    receiver,
                    timers: BinaryHeap::new(),
                }
                .run();
            })
            .expect("failed to spawn the reactor thread");

        handle
    }

    fn run(&mut self) {
        tracing::debug!("reactor started");

        loop {
            let next = match self.timers.peek() {
                Some(timer) => {
                    let wait = timer.deadline.saturating_duration_since(Instant::now());
                    match self.receiver.recv_timeout(wait) {
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            if let Some(command) = next {
                if !self.apply(command) {
                    break;
                }
            }

            loop {
                match self.receiver.try_recv() {
                    Ok(command) => {
                        if !self.apply(command) {
                            tracing::debug!(pending = self.timers.len(), "reactor stopped");
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break,
                }
            }

            self.fire_expired();
        }

        tracing::debug!(pending = self.timers.len(), "reactor stopped");
    }

    /// Applies one command; returns `false` when the loop must stop.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::SetTimer {
                deadline,
                waker,
                cancelled,
            } => {
                self.timers.push(TimerEntry {
                    deadline,
                    waker,
                    cancelled,
                });
                true
            }
            Command::Shutdown => false,
        }
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();

        while self.timers.peek().is_some_and(|t| t.deadline <= now) {
            if let Some(timer) = self.timers.pop() {
                timer.fire();
            }
        }
    }
}
