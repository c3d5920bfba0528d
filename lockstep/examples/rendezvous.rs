//! Example: handing values from a blocking producer thread to a task

use lockstep::task_source::RechargeableCompletionSource;
use std::thread;
use std::time::Duration;

#[lockstep::main]
async fn main() {
    let source = RechargeableCompletionSource::new();

    let producer = {
        let source = source.clone();
        thread::spawn(move || {
            for i in 0..5 {
                thread::sleep(Duration::from_millis(200));
                println!("Add {i} on {:?}", thread::current().id());

                // Returns once the consumer has dropped the container.
                if let Err(err) = source.set_result_and_wait(i) {
                    eprintln!("producer stopped: {err}");
                    return;
                }
            }
        })
    };

    for _ in 0..5 {
        let value = match source.get_value() {
            Ok(pending) => pending.await,
            Err(err) => {
                eprintln!("consumer busy: {err}");
                break;
            }
        };

        match value {
            Ok(container) => println!("Get {} on {:?}", *container, thread::current().id()),
            Err(err) => eprintln!("no value: {err}"),
        }
    }

    let _ = producer.join();
}
