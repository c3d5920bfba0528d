use super::join_point::{JoinPoint, Wait};
use crate::error::{Error, Result};

use parking_lot::Mutex;

use std::sync::Arc;

/// Future returned by [`SinglePhaseBarrier::signal_and_wait`].
pub type BarrierWait = Wait;

/// A rendezvous point for a fixed number of participants.
///
/// Each call to [`signal_and_wait`](Self::signal_and_wait) counts one
/// arrival. When the last participant arrives every waiter of the phase is
/// released and the barrier resets for the next phase.
pub struct SinglePhaseBarrier {
    participant_count: usize,
    state: Mutex<Phase>,
}

struct Phase {
    arrived: usize,
    done: Arc<JoinPoint>,
}

impl SinglePhaseBarrier {
    pub fn new(participant_count: usize) -> Result<Self> {
        if participant_count == 0 {
            return Err(Error::invalid_argument(
                "participant_count",
                "must be at least 1",
            ));
        }

        Ok(Self {
            participant_count,
            state: Mutex::new(Phase {
                arrived: 0,
                done: Arc::new(JoinPoint::new()),
            }),
        })
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    /// Registers an arrival.
    ///
    /// The last arrival of a phase gets a wait that is already finished.
    pub fn signal_and_wait(&self) -> BarrierWait {
        let mut state = self.state.lock();
        state.arrived += 1;

        if state.arrived < self.participant_count {
            return Wait::new(state.done.clone());
        }

        state.arrived = 0;
        let done = std::mem::replace(&mut state.done, Arc::new(JoinPoint::new()));
        drop(state);

        if self.participant_count > 1 {
            tracing::trace!(participants = self.participant_count, "barrier phase complete");
            done.complete();
        }

        Wait::finished()
    }
}

impl std::fmt::Debug for SinglePhaseBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinglePhaseBarrier")
            .field("participant_count", &self.participant_count)
            .field("arrived", &self.state.lock().arrived)
            .finish()
    }
}
