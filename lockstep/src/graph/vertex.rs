use super::handle::ReadHold;
use crate::CancellationToken;
use crate::combinator::with_cancellation;
use crate::error::Result;
use crate::sync::{CountdownEvent, Mutex, OwnedMutexGuard};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Identifies a vertex inside the [`LockGraph`](super::LockGraph) that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    /// Id of the owning [`LockGraph`](super::LockGraph).
    pub(super) graph: u64,

    /// Position in the owning graph's arena.
    pub(super) index: usize,
}

impl VertexId {
    /// Position of the vertex in creation order.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

/// Lock state of one vertex.
///
/// `guard` is held by a writer for the lifetime of its lock, and briefly
/// by anyone taking a shared hold. `readers` counts shared holds; a writer
/// waits for it to drain after taking `guard`, and nobody can add to it
/// meanwhile.
pub(super) struct Vertex {
    /// Arena indices of the direct successors.
    ///
    /// A set, so duplicate edges are caught on insert and traversal order
    /// is stable.
    pub(super) edges: BTreeSet<usize>,

    /// FIFO guard held by a writer and briefly by every reader while it
    /// bumps `readers`.
    guard: Arc<Mutex<()>>,

    /// Outstanding shared holds, direct or taken on behalf of an ancestor.
    /// A writer waits for it to reach zero.
    readers: Arc<CountdownEvent>,
}

impl Vertex {
    pub(super) fn new() -> Self {
        Self {
            edges: BTreeSet::new(),
            guard: Arc::new(Mutex::new(())),
            readers: Arc::new(CountdownEvent::new(0)),
        }
    }

    pub(super) async fn read_hold(&self, token: &CancellationToken) -> Result<ReadHold> {
        let _guard = self.guard.lock_cancellable(token).await?;
        self.readers.add_count(1)?;

        Ok(ReadHold::new(self.readers.clone()))
    }

    pub(super) async fn exclusive(&self, token: &CancellationToken) -> Result<OwnedMutexGuard<()>> {
        let guard = with_cancellation(self.guard.lock_owned(), token).await?;
        with_cancellation(self.readers.wait(), token).await?;

        Ok(guard)
    }

    pub(super) fn readers(&self) -> usize {
        self.readers.count()
    }

    pub(super) fn is_write_locked(&self) -> bool {
        self.guard.is_locked()
    }
}
