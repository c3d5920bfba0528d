use lockstep::combinator::{
    try_execute_with_timeout, wait_all_tasks_but_check, when_all_or_error, with_cancellation,
};
use lockstep::time::sleep;
use lockstep::{BoxError, CancellationToken, task};
use parking_lot::Mutex;

use std::future::{Future, pending, ready};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

type Op = Pin<Box<dyn Future<Output = Result<u64, &'static str>> + Send>>;

fn after(ms: u64, outcome: Result<u64, &'static str>) -> Op {
    Box::pin(async move {
        sleep(Duration::from_millis(ms)).await;
        outcome
    })
}

#[lockstep::test]
async fn when_all_or_error_collects_every_result() {
    let ops = vec![after(30, Ok(1)), after(10, Ok(2)), after(20, Ok(3))];

    assert_eq!(when_all_or_error(ops).await, Ok(vec![1, 2, 3]));
}

#[lockstep::test]
async fn when_all_or_error_fails_fast() {
    let start = Instant::now();
    let ops: Vec<Op> = vec![
        Box::pin(pending()),
        after(20, Err("lost connection")),
        after(5_000, Ok(3)),
    ];

    assert_eq!(when_all_or_error(ops).await, Err("lost connection"));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[lockstep::test]
async fn wait_all_but_check_reports_early_and_waits_for_all() {
    let faults = Arc::new(AtomicUsize::new(0));
    let reported_at = Arc::new(Mutex::new(None));
    let start = Instant::now();

    let ops = vec![after(10, Err("first")), after(80, Ok(2)), after(20, Err("second"))];
    let all = {
        let faults = faults.clone();
        let reported_at = reported_at.clone();
        wait_all_tasks_but_check(ops, move || {
            faults.fetch_add(1, Ordering::SeqCst);
            *reported_at.lock() = Some(start.elapsed());
        })
        .unwrap()
    };

    let watcher = {
        let faults = faults.clone();
        task::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            faults.load(Ordering::SeqCst)
        })
    };

    assert_eq!(all.await, Err("first"));
    assert_eq!(faults.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() >= Duration::from_millis(80));

    assert_eq!(watcher.await, 1);
    let reported_at = (*reported_at.lock()).expect("callback should have run");
    assert!(reported_at < Duration::from_millis(80));
}

#[lockstep::test]
async fn slow_operation_times_out() {
    let race = try_execute_with_timeout(
        sleep(Duration::from_secs(5)),
        Duration::from_secs(1),
        &CancellationToken::none(),
    )
    .unwrap();

    let start = Instant::now();
    assert!(!race.await);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[lockstep::test]
async fn ready_operation_beats_the_timeout() {
    let race =
        try_execute_with_timeout(ready(()), Duration::from_secs(1), &CancellationToken::none())
            .unwrap();

    assert!(race.await);
}

#[lockstep::test]
async fn cancelled_token_ends_the_delay_early() {
    let token = CancellationToken::new();
    token.cancel_after(Duration::from_millis(20));

    let race =
        try_execute_with_timeout(pending::<()>(), Duration::from_secs(10), &token).unwrap();

    let start = Instant::now();
    assert!(!race.await);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn zero_timeout_is_rejected() {
    let err = try_execute_with_timeout(ready(()), Duration::ZERO, &CancellationToken::none())
        .err()
        .unwrap();

    assert!(err.is_invalid_argument());
}

#[lockstep::test]
async fn with_cancellation_passes_through_or_cancels() {
    let none = CancellationToken::none();
    assert_eq!(with_cancellation(ready(9), &none).await.unwrap(), 9);

    let token = CancellationToken::new();
    token.cancel_after(Duration::from_millis(10));

    let err = with_cancellation(sleep(Duration::from_secs(5)), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[lockstep::test]
async fn faults_can_be_boxed_errors() {
    let ops: Vec<Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>> = vec![
        Box::pin(async { Ok(()) }),
        Box::pin(async { Err("bad input".into()) }),
    ];

    let err = when_all_or_error(ops).await.unwrap_err();
    assert_eq!(err.to_string(), "bad input");
}
