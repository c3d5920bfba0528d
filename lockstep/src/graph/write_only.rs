use super::dag::LockGraph;
use super::handle::LockHandle;
use super::vertex::VertexId;
use crate::CancellationToken;
use crate::error::Result;

/// A [`LockGraph`] that only hands out exclusive locks.
///
/// Locking a vertex still cascades shared holds over its descendants, so
/// two writers conflict exactly when one vertex is reachable from the
/// other.
#[derive(Debug, Default)]
pub struct WriteLockGraph {
    /// Arena and edges; only the write path is exposed.
    inner: LockGraph,
}

impl WriteLockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self) -> VertexId {
        self.inner.add_vertex()
    }

    /// See [`LockGraph::add_edges`].
    pub fn add_edges(&mut self, from: VertexId, to: &[VertexId]) -> Result<()> {
        self.inner.add_edges(from, to)
    }

    pub fn validate(&self, root: VertexId) -> Result<()> {
        self.inner.validate(root)
    }

    pub fn validate_all(&self) -> Result<()> {
        self.inner.validate_all()
    }

    /// Takes the lock on `vertex`, with the semantics of
    /// [`LockGraph::write_lock`].
    pub async fn lock(&self, vertex: VertexId, token: &CancellationToken) -> Result<LockHandle> {
        self.inner.write_lock(vertex, token).await
    }

    pub fn successors(&self, vertex: VertexId) -> Result<Vec<VertexId>> {
        self.inner.successors(vertex)
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.vertex_count()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.inner.contains(vertex)
    }
}
