use crate::sync::{CountdownEvent, OwnedMutexGuard};

use std::fmt;
use std::sync::Arc;

/// One shared hold on a vertex. Dropping it signals the vertex's reader
/// count.
pub(super) struct ReadHold {
    /// Reader count of the held vertex.
    readers: Arc<CountdownEvent>,
}

impl ReadHold {
    pub(super) fn new(readers: Arc<CountdownEvent>) -> Self {
        Self { readers }
    }
}

impl Drop for ReadHold {
    fn drop(&mut self) {
        if let Err(err) = self.readers.signal() {
            tracing::error!(%err, "reader count released more often than taken");
        }
    }
}

enum MainHold {
    Exclusive(OwnedMutexGuard<()>),
    Shared(ReadHold),
}

/// A granted graph lock.
///
/// Holds the lock on the requested vertex plus one shared hold per
/// descendant visit. Everything is released on [`release`](Self::release)
/// or drop, whichever comes first.
#[must_use = "the lock is released as soon as the handle is dropped"]
pub struct LockHandle {
    /// Hold on the requested vertex; `None` once released.
    main: Option<MainHold>,

    /// One entry per descendant path visit, so a vertex reachable twice
    /// appears twice.
    descendants: Vec<ReadHold>,
}

impl LockHandle {
    pub(super) fn exclusive(guard: OwnedMutexGuard<()>, descendants: Vec<ReadHold>) -> Self {
        Self {
            main: Some(MainHold::Exclusive(guard)),
            descendants,
        }
    }

    pub(super) fn shared(hold: ReadHold, descendants: Vec<ReadHold>) -> Self {
        Self {
            main: Some(MainHold::Shared(hold)),
            descendants,
        }
    }

    /// Releases the lock. Further calls do nothing.
    pub fn release(&mut self) {
        let kind = match self.main.take() {
            Some(MainHold::Exclusive(guard)) => {
                drop(guard);
                "write"
            }
            Some(MainHold::Shared(hold)) => {
                drop(hold);
                "read"
            }
            None => return,
        };

        let descendants = self.descendants.len();
        self.descendants.clear();
        tracing::trace!(kind, descendants, "graph lock released");
    }

    pub fn is_released(&self) -> bool {
        self.main.is_none()
    }

    /// Whether this is a write lock.
    pub fn is_exclusive(&self) -> bool {
        matches!(self.main, Some(MainHold::Exclusive(_)))
    }

    /// Number of shared holds taken on descendants.
    pub fn descendant_holds(&self) -> usize {
        self.descendants.len()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("exclusive", &self.is_exclusive())
            .field("released", &self.is_released())
            .field("descendant_holds", &self.descendants.len())
            .finish()
    }
}
