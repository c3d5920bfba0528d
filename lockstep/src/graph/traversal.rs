//! Iterative walks over the edge sets of a graph.

use super::vertex::Vertex;
use crate::error::{Error, Result};

/// Returns `true` if a cycle is reachable from any of `roots`.
///
/// Depth-first with an on-path marker; vertices whose subtree was fully
/// explored are not entered again, so the whole call is O(V + E).
pub(super) fn has_cycle(vertices: &[Vertex], roots: impl IntoIterator<Item = usize>) -> bool {
    let mut on_path = vec![false; vertices.len()];
    let mut explored = vec![false; vertices.len()];

    for root in roots {
        if explored[root] {
            continue;
        }

        on_path[root] = true;
        let mut stack = vec![(root, vertices[root].edges.iter())];

        while let Some((_, children)) = stack.last_mut() {
            match children.next() {
                Some(&child) if on_path[child] => return true,
                Some(&child) => {
                    if !explored[child] {
                        on_path[child] = true;
                        stack.push((child, vertices[child].edges.iter()));
                    }
                }
                None => {
                    if let Some((vertex, _)) = stack.pop() {
                        on_path[vertex] = false;
                        explored[vertex] = true;
                    }
                }
            }
        }
    }

    false
}

/// Lists the descendants of `root` in pre-order, once per path.
///
/// A vertex reachable along two paths appears twice; each visit takes its
/// own shared hold. Fails with [`Error::CycleDetected`] instead of looping
/// when a path returns to one of its own vertices.
pub(super) fn descendant_visits(vertices: &[Vertex], root: usize) -> Result<Vec<usize>> {
    let mut visits = Vec::new();
    let mut path = vec![root];
    let mut stack: Vec<(usize, usize)> = children(vertices, root, 1).collect();

    while let Some((depth, vertex)) = stack.pop() {
        path.truncate(depth);

        if path.contains(&vertex) {
            return Err(Error::CycleDetected);
        }

        path.push(vertex);
        visits.push(vertex);
        stack.extend(children(vertices, vertex, depth + 1));
    }

    Ok(visits)
}

/// Children of `vertex` tagged with their depth, reversed so that popping
/// from a stack yields them in edge order.
fn children(
    vertices: &[Vertex],
    vertex: usize,
    depth: usize,
) -> impl Iterator<Item = (usize, usize)> + '_ {
    vertices[vertex]
        .edges
        .iter()
        .rev()
        .map(move |&child| (depth, child))
}
