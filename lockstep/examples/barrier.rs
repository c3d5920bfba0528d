//! Example: workers meeting at a barrier between phases

use lockstep::sync::SinglePhaseBarrier;
use lockstep::task;
use lockstep::time::sleep;
use std::sync::Arc;
use std::time::Duration;

#[lockstep::main(worker_threads = 4)]
async fn main() -> lockstep::Result<()> {
    let barrier = Arc::new(SinglePhaseBarrier::new(3)?);

    let workers: Vec<_> = (0..3u64)
        .map(|id| {
            let barrier = barrier.clone();
            task::spawn(async move {
                for phase in 0..3 {
                    sleep(Duration::from_millis(50 * (id + 1))).await;
                    println!("worker {id} finished phase {phase}");
                    barrier.signal_and_wait().await;
                }
            })
        })
        .collect();

    for worker in workers {
        worker.await;
    }

    println!("all phases done");
    Ok(())
}
