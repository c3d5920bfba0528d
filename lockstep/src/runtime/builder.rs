use super::Runtime;

use std::thread;

/// Configuration for a [`Runtime`].
///
/// The worker count is the only knob. It defaults to the available
/// parallelism of the machine, falling back to `1`.
///
/// # Examples
///
/// ```rust,no_run
/// let runtime = lockstep::RuntimeBuilder::new()
///     .worker_threads(4)
///     .build();
///
/// assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    worker_threads: usize,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self { worker_threads }
    }

    /// Sets the number of worker threads.
    ///
    /// Producers that block a thread (see
    /// [`RechargeableCompletionSource::set_result_and_wait`]) need at least
    /// one worker left for the consumer, so keep this above `1` when mixing
    /// blocking producers with tasks on the same runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    ///
    /// [`RechargeableCompletionSource::set_result_and_wait`]: crate::task_source::RechargeableCompletionSource::set_result_and_wait
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Starts the reactor and the worker pool.
    pub fn build(self) -> Runtime {
        tracing::debug!(worker_threads = self.worker_threads, "building runtime");
        Runtime::new(self.worker_threads)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
