use super::handle::{LockHandle, ReadHold};
use super::traversal;
use super::vertex::{Vertex, VertexId};
use crate::CancellationToken;
use crate::error::{Error, Result};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// A directed graph of lockable vertices.
///
/// Locking a vertex also takes a shared hold on everything reachable from
/// it, so a writer on a vertex excludes writers on its descendants, and a
/// writer on a descendant waits until every ancestor lock covering it is
/// gone. Vertices are acquired top-down along edges; there is no global
/// order across unrelated vertices.
///
/// Edges are only added through `&mut self`, which means the structure is
/// frozen while any lock future borrows the graph. Cycles are not rejected
/// on insertion; call [`validate`](Self::validate) or
/// [`validate_all`](Self::validate_all) once the graph is built. Lock
/// acquisition on a vertex that reaches a cycle fails with
/// [`Error::CycleDetected`].
pub struct LockGraph {
    /// Process-unique id stamped into every [`VertexId`] this graph hands
    /// out.
    id: u64,

    /// Arena indexed by [`VertexId::index`]. Vertices are never removed.
    vertices: Vec<Vertex>,
}

impl LockGraph {
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            vertices: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self) -> VertexId {
        self.vertices.push(Vertex::new());

        VertexId {
            graph: self.id,
            index: self.vertices.len() - 1,
        }
    }

    /// Adds an edge from `from` to each of `to`.
    ///
    /// Either every edge is added or none is. Fails with
    /// [`Error::InvalidArgument`] if `to` is empty or repeats a vertex, if
    /// any vertex belongs to another graph, or if one of the edges already
    /// exists. Self-loops are accepted here and caught by validation.
    pub fn add_edges(&mut self, from: VertexId, to: &[VertexId]) -> Result<()> {
        let from = self.index_of(from)?;

        if to.is_empty() {
            return Err(Error::invalid_argument("to", "vertex list is empty"));
        }

        let mut added = BTreeSet::new();
        for &vertex in to {
            let index = self.index_of(vertex)?;

            if self.vertices[from].edges.contains(&index) {
                return Err(Error::invalid_argument("to", "edge already exists"));
            }

            if !added.insert(index) {
                return Err(Error::invalid_argument("to", "vertex listed twice"));
            }
        }

        self.vertices[from].edges.extend(added);
        Ok(())
    }

    /// Checks that no cycle is reachable from `root`.
    pub fn validate(&self, root: VertexId) -> Result<()> {
        let root = self.index_of(root)?;

        if traversal::has_cycle(&self.vertices, [root]) {
            return Err(Error::CycleDetected);
        }

        Ok(())
    }

    /// Checks that the graph has no cycle anywhere.
    pub fn validate_all(&self) -> Result<()> {
        if traversal::has_cycle(&self.vertices, 0..self.vertices.len()) {
            return Err(Error::CycleDetected);
        }

        Ok(())
    }

    /// Takes an exclusive lock on `vertex`.
    ///
    /// First takes a shared hold on every descendant, then the vertex's own
    /// guard (queued in arrival order), then waits for existing readers of
    /// the vertex to leave. If `token` is cancelled along the way every hold
    /// taken so far is released and the call fails with
    /// [`Error::Cancelled`]; dropping the future has the same effect.
    ///
    /// # Cost
    ///
    /// The cascade takes one hold per *path* to each descendant, not one per
    /// vertex. A chain of `k` stacked diamonds under `vertex` takes on the
    /// order of `2^k` holds, and the acquisition and the handle grow with
    /// it. Keep fan-in shallow below vertices that get locked often.
    pub async fn write_lock(&self, vertex: VertexId, token: &CancellationToken) -> Result<LockHandle> {
        let index = self.index_of(vertex)?;
        let descendants = self.descendant_holds(index, token).await?;
        let guard = self.vertices[index].exclusive(token).await?;

        tracing::trace!(%vertex, descendants = descendants.len(), "write lock acquired");
        Ok(LockHandle::exclusive(guard, descendants))
    }

    /// Takes a shared lock on `vertex`.
    ///
    /// Same cascade as [`write_lock`](Self::write_lock), followed by one
    /// shared hold on the vertex itself. Shared locks coexist; they wait
    /// only for a writer currently holding the vertex or a descendant.
    ///
    /// The cascade has the same per-path cost as `write_lock`.
    pub async fn read_lock(&self, vertex: VertexId, token: &CancellationToken) -> Result<LockHandle> {
        let index = self.index_of(vertex)?;
        let descendants = self.descendant_holds(index, token).await?;
        let hold = self.vertices[index].read_hold(token).await?;

        tracing::trace!(%vertex, descendants = descendants.len(), "read lock acquired");
        Ok(LockHandle::shared(hold, descendants))
    }

    /// Direct successors of `vertex`, in creation order.
    pub fn successors(&self, vertex: VertexId) -> Result<Vec<VertexId>> {
        let index = self.index_of(vertex)?;

        Ok(self.vertices[index]
            .edges
            .iter()
            .map(|&index| VertexId {
                graph: self.id,
                index,
            })
            .collect())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        vertex.graph == self.id && vertex.index < self.vertices.len()
    }

    /// Number of shared holds currently on `vertex`.
    pub fn reader_count(&self, vertex: VertexId) -> Result<usize> {
        let index = self.index_of(vertex)?;
        Ok(self.vertices[index].readers())
    }

    /// Whether a writer currently owns the guard of `vertex`.
    pub fn is_write_locked(&self, vertex: VertexId) -> Result<bool> {
        let index = self.index_of(vertex)?;
        Ok(self.vertices[index].is_write_locked())
    }

    async fn descendant_holds(&self, root: usize, token: &CancellationToken) -> Result<Vec<ReadHold>> {
        let visits = traversal::descendant_visits(&self.vertices, root)?;

        let mut holds = Vec::with_capacity(visits.len());
        for index in visits {
            holds.push(self.vertices[index].read_hold(token).await?);
        }

        Ok(holds)
    }

    fn index_of(&self, vertex: VertexId) -> Result<usize> {
        if !self.contains(vertex) {
            return Err(Error::invalid_argument(
                "vertex",
                "does not belong to this graph",
            ));
        }

        Ok(vertex.index)
    }
}

impl Default for LockGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LockGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges: usize = self.vertices.iter().map(|v| v.edges.len()).sum();

        f.debug_struct("LockGraph")
            .field("vertices", &self.vertices.len())
            .field("edges", &edges)
            .finish()
    }
}
