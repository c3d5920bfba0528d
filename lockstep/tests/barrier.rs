mod common;

use common::stays_pending;
use lockstep::sync::{ContinuationQueue, SinglePhaseBarrier};
use lockstep::task;
use lockstep::time::sleep;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[lockstep::test]
async fn barrier_releases_every_participant_together() {
    let barrier = Arc::new(SinglePhaseBarrier::new(3).unwrap());
    let passed = Arc::new(AtomicUsize::new(0));

    let spawn_participant = || {
        let barrier = barrier.clone();
        let passed = passed.clone();
        task::spawn(async move {
            barrier.signal_and_wait().await;
            passed.fetch_add(1, Ordering::SeqCst);
        })
    };

    let first = spawn_participant();
    let second = spawn_participant();

    assert!(stays_pending(&first).await);
    assert_eq!(passed.load(Ordering::SeqCst), 0);

    let last = barrier.signal_and_wait();
    assert!(last.is_finished());
    last.await;

    first.await;
    second.await;
    assert_eq!(passed.load(Ordering::SeqCst), 2);
}

#[lockstep::test]
async fn barrier_runs_several_phases() {
    let barrier = Arc::new(SinglePhaseBarrier::new(2).unwrap());
    let rounds = 5;

    let peer = {
        let barrier = barrier.clone();
        task::spawn(async move {
            for _ in 0..rounds {
                barrier.signal_and_wait().await;
            }
        })
    };

    for _ in 0..rounds {
        sleep(Duration::from_millis(2)).await;
        barrier.signal_and_wait().await;
    }

    peer.await;
}

#[lockstep::test]
async fn queue_releases_one_waiter_per_finish() {
    let queue = Arc::new(ContinuationQueue::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut waiters = Vec::new();
    for id in 0..3 {
        let wait = queue.wait();
        let order = order.clone();
        waiters.push(task::spawn(async move {
            wait.await;
            order.lock().push(id);
        }));
    }

    assert!(stays_pending(&waiters[0]).await);

    queue.finish_task().unwrap();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(*order.lock(), vec![0]);
    assert!(!waiters[1].is_finished());

    queue.finish_task().unwrap();
    queue.finish_task().unwrap();
    for waiter in waiters {
        waiter.await;
    }

    assert_eq!(*order.lock(), vec![0, 1, 2]);
    assert!(queue.finish_task().unwrap_err().is_invalid_operation());
}
