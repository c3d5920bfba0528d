mod common;

use common::{SETTLE, init_tracing};
use lockstep::task;
use lockstep::task_source::RechargeableCompletionSource;
use lockstep::time::sleep;

use std::thread;
use std::time::Duration;

async fn wait_for_thread<T>(handle: &thread::JoinHandle<T>) {
    while !handle.is_finished() {
        sleep(Duration::from_millis(5)).await;
    }
}

#[lockstep::test]
async fn producer_returns_only_after_release() {
    init_tracing();
    let source = RechargeableCompletionSource::new();

    let producer = {
        let source = source.clone();
        thread::spawn(move || source.set_result_and_wait(42))
    };

    let container = source.get_value().unwrap().await.unwrap();
    assert_eq!(*container, 42);

    sleep(SETTLE).await;
    assert!(!producer.is_finished());

    container.release();
    wait_for_thread(&producer).await;
    producer.join().unwrap().unwrap();
}

#[lockstep::test]
async fn second_consumer_fails_while_container_lives() {
    let source = RechargeableCompletionSource::new();

    let producer = {
        let source = source.clone();
        thread::spawn(move || source.set_result_and_wait("payload"))
    };

    let container = source.get_value().unwrap().await.unwrap();
    assert!(source.get_value().unwrap_err().is_invalid_operation());

    drop(container);
    wait_for_thread(&producer).await;
    producer.join().unwrap().unwrap();
}

#[lockstep::test]
async fn values_arrive_one_at_a_time_in_order() {
    let source = RechargeableCompletionSource::new();

    let producer = {
        let source = source.clone();
        thread::spawn(move || {
            for n in 0..5 {
                source.set_result_and_wait(n)?;
            }
            Ok::<_, lockstep::Error>(())
        })
    };

    for expected in 0..5 {
        let value = source.get_value().unwrap().await.unwrap().into_value();
        assert_eq!(value, expected);
    }

    wait_for_thread(&producer).await;
    producer.join().unwrap().unwrap();
}

#[lockstep::test]
async fn async_producers_take_turns() {
    let source = RechargeableCompletionSource::new();

    let producers: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|value| {
            let source = source.clone();
            task::spawn(async move { source.set_result_and_wait_async(value).await })
        })
        .collect();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let container = source.get_value().unwrap().await.unwrap();
        seen.push(*container);
    }
    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);

    for producer in producers {
        producer.await.unwrap();
    }
}

#[lockstep::test]
async fn dropped_get_value_frees_the_consumer_slot() {
    let source = RechargeableCompletionSource::<u8>::new();

    drop(source.get_value().unwrap());

    assert!(source.get_value().is_ok());
}
