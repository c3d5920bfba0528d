//! Example: cascading write locks on a diamond-shaped graph

use lockstep::graph::LockGraph;
use lockstep::time::sleep;
use lockstep::{CancellationToken, task};
use std::sync::Arc;
use std::time::Duration;

#[lockstep::main]
async fn main() -> lockstep::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("lockstep=trace")
        .init();

    let mut graph = LockGraph::new();
    let root = graph.add_vertex();
    let left = graph.add_vertex();
    let right = graph.add_vertex();
    let sink = graph.add_vertex();

    graph.add_edges(root, &[left, right])?;
    graph.add_edges(left, &[sink])?;
    graph.add_edges(right, &[sink])?;
    graph.validate_all()?;

    let graph = Arc::new(graph);

    // Siblings share no path, so both writers get in at once.
    let left_lock = graph.write_lock(left, &CancellationToken::none()).await?;
    let right_lock = graph.write_lock(right, &CancellationToken::none()).await?;
    println!("left and right are both write-locked");

    let sink_writer = {
        let graph = graph.clone();
        task::spawn(async move {
            let _lock = graph.write_lock(sink, &CancellationToken::none()).await?;
            println!("sink acquired once both siblings let go");
            Ok::<_, lockstep::Error>(())
        })
    };

    sleep(Duration::from_millis(100)).await;
    drop(left_lock);
    sleep(Duration::from_millis(100)).await;
    drop(right_lock);
    sink_writer.await?;

    // A writer that gives up releases whatever part of the cascade it held.
    let blocker = graph.write_lock(sink, &CancellationToken::none()).await?;
    let token = CancellationToken::new();
    token.cancel_after(Duration::from_millis(50));

    match graph.write_lock(root, &token).await {
        Err(err) if err.is_cancelled() => println!("root lock cancelled while the sink was busy"),
        other => println!("unexpected: {other:?}"),
    }
    drop(blocker);

    Ok(())
}
