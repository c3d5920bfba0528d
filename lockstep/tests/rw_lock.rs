mod common;

use common::{init_tracing, stays_pending};
use lockstep::graph::{LockGraph, VertexId};
use lockstep::{CancellationToken, Error, task};

use std::sync::Arc;

struct Diamond {
    graph: Arc<LockGraph>,
    root: VertexId,
    left: VertexId,
    right: VertexId,
    sink: VertexId,
}

fn diamond() -> Diamond {
    let mut graph = LockGraph::new();
    let root = graph.add_vertex();
    let left = graph.add_vertex();
    let right = graph.add_vertex();
    let sink = graph.add_vertex();

    graph.add_edges(root, &[left, right]).unwrap();
    graph.add_edges(left, &[sink]).unwrap();
    graph.add_edges(right, &[sink]).unwrap();
    graph.validate_all().unwrap();

    Diamond {
        graph: Arc::new(graph),
        root,
        left,
        right,
        sink,
    }
}

fn spawn_write(
    graph: &Arc<LockGraph>,
    vertex: VertexId,
    token: CancellationToken,
) -> task::JoinHandle<lockstep::Result<lockstep::graph::LockHandle>> {
    let graph = graph.clone();
    task::spawn(async move { graph.write_lock(vertex, &token).await })
}

fn spawn_read(
    graph: &Arc<LockGraph>,
    vertex: VertexId,
) -> task::JoinHandle<lockstep::Result<lockstep::graph::LockHandle>> {
    let graph = graph.clone();
    task::spawn(async move { graph.read_lock(vertex, &CancellationToken::none()).await })
}

#[lockstep::test]
async fn readers_share_a_vertex() {
    init_tracing();
    let d = diamond();
    let none = CancellationToken::none();

    let first = d.graph.read_lock(d.left, &none).await.unwrap();
    let second = d.graph.read_lock(d.left, &none).await.unwrap();

    assert!(!first.is_exclusive());
    assert_eq!(d.graph.reader_count(d.left).unwrap(), 2);
    assert_eq!(d.graph.reader_count(d.sink).unwrap(), 2);

    drop((first, second));
    assert_eq!(d.graph.reader_count(d.left).unwrap(), 0);
}

#[lockstep::test]
async fn write_waits_for_reader() {
    let d = diamond();

    let read = d.graph.read_lock(d.left, &CancellationToken::none()).await.unwrap();
    let write = spawn_write(&d.graph, d.left, CancellationToken::none());

    assert!(stays_pending(&write).await);
    drop(read);

    let handle = write.await.unwrap();
    assert!(handle.is_exclusive());
}

#[lockstep::test]
async fn read_waits_for_writer() {
    let d = diamond();

    let write = d.graph.write_lock(d.right, &CancellationToken::none()).await.unwrap();
    let read = spawn_read(&d.graph, d.right);

    assert!(stays_pending(&read).await);
    drop(write);

    assert!(read.await.is_ok());
}

#[lockstep::test]
async fn second_writer_waits_for_first() {
    let mut graph = LockGraph::new();
    let only = graph.add_vertex();
    let graph = Arc::new(graph);

    let first = graph.write_lock(only, &CancellationToken::none()).await.unwrap();
    let second = spawn_write(&graph, only, CancellationToken::none());

    assert!(stays_pending(&second).await);
    drop(first);

    assert!(second.await.is_ok());
}

#[lockstep::test]
async fn root_writer_blocks_sink_writer() {
    let d = diamond();

    let root = d.graph.write_lock(d.root, &CancellationToken::none()).await.unwrap();
    let sink = spawn_write(&d.graph, d.sink, CancellationToken::none());

    assert!(stays_pending(&sink).await);
    drop(root);

    assert!(sink.await.is_ok());
}

#[lockstep::test]
async fn sink_writer_blocks_root_writer() {
    let d = diamond();

    let sink = d.graph.write_lock(d.sink, &CancellationToken::none()).await.unwrap();
    let root = spawn_write(&d.graph, d.root, CancellationToken::none());

    assert!(stays_pending(&root).await);
    drop(sink);

    let root = root.await.unwrap();
    assert_eq!(root.descendant_holds(), 4);
}

#[lockstep::test]
async fn siblings_do_not_block_each_other() {
    let d = diamond();
    let none = CancellationToken::none();

    let left = d.graph.write_lock(d.left, &none).await.unwrap();
    let right = d.graph.write_lock(d.right, &none).await.unwrap();

    assert!(d.graph.is_write_locked(d.left).unwrap());
    assert!(d.graph.is_write_locked(d.right).unwrap());
    assert_eq!(d.graph.reader_count(d.sink).unwrap(), 2);

    drop((left, right));
}

#[lockstep::test]
async fn sink_writer_waits_for_both_siblings() {
    let d = diamond();
    let none = CancellationToken::none();

    let left = d.graph.write_lock(d.left, &none).await.unwrap();
    let right = d.graph.write_lock(d.right, &none).await.unwrap();
    let sink = spawn_write(&d.graph, d.sink, none);

    assert!(stays_pending(&sink).await);
    drop(left);
    assert!(stays_pending(&sink).await);
    drop(right);

    assert!(sink.await.is_ok());
}

#[lockstep::test]
async fn cancelled_writer_leaves_holder_alone() {
    let d = diamond();

    let holder = d.graph.write_lock(d.left, &CancellationToken::none()).await.unwrap();

    let token = CancellationToken::new();
    let waiter = spawn_write(&d.graph, d.left, token.clone());
    assert!(stays_pending(&waiter).await);

    token.cancel();
    let err = waiter.await.unwrap_err();
    assert!(err.is_cancelled());

    assert!(!holder.is_released());
    assert!(d.graph.is_write_locked(d.left).unwrap());
    drop(holder);

    let again = d.graph.write_lock(d.left, &CancellationToken::none()).await;
    assert!(again.is_ok());
}

#[lockstep::test]
async fn cancelled_cascade_rolls_back_partial_holds() {
    let d = diamond();

    // The root's cascade gets `left` and then blocks on the sink's guard.
    let sink = d.graph.write_lock(d.sink, &CancellationToken::none()).await.unwrap();

    let token = CancellationToken::new();
    let root = spawn_write(&d.graph, d.root, token.clone());
    assert!(stays_pending(&root).await);
    assert_eq!(d.graph.reader_count(d.left).unwrap(), 1);

    token.cancel();
    assert!(matches!(root.await, Err(Error::Cancelled)));

    assert_eq!(d.graph.reader_count(d.left).unwrap(), 0);
    assert_eq!(d.graph.reader_count(d.right).unwrap(), 0);
    assert!(!d.graph.is_write_locked(d.root).unwrap());
    drop(sink);
}

#[lockstep::test]
async fn already_cancelled_token_fails_when_contended() {
    let d = diamond();

    let holder = d.graph.write_lock(d.right, &CancellationToken::none()).await.unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let err = d.graph.read_lock(d.right, &token).await.unwrap_err();
    assert!(err.is_cancelled());
    drop(holder);
}
