//! Hierarchical read/write locks over a directed acyclic graph.
//!
//! Each vertex has a fair exclusive guard and an awaitable reader count.
//! Locking a vertex cascades a shared hold over every vertex reachable
//! from it:
//!
//! ```text
//!        root            write(root) holds: left, sink, right, sink
//!       /    \           write(left) holds: sink
//!    left    right       write(sink) waits for every hold on sink
//!       \    /
//!        sink
//! ```
//!
//! So a write on `root` and a write on `sink` exclude each other in both
//! directions, while `left` and `right` can be written concurrently.
//!
//! A cancelled or dropped acquisition releases everything it took so far.

mod dag;
mod handle;
mod traversal;
mod vertex;
mod write_only;

pub use dag::LockGraph;
pub use handle::LockHandle;
pub use vertex::VertexId;
pub use write_only::WriteLockGraph;
