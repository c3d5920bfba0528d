#![allow(dead_code)]

use lockstep::task::JoinHandle;
use lockstep::time::sleep;

use std::time::Duration;

/// How long a test lets a task run before deciding it is blocked.
pub const SETTLE: Duration = Duration::from_millis(50);

/// Installs a test-writer subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Gives `handle` time to make progress and reports whether it is still
/// waiting.
pub async fn stays_pending<T>(handle: &JoinHandle<T>) -> bool {
    sleep(SETTLE).await;
    !handle.is_finished()
}
