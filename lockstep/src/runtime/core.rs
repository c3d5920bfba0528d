use super::executor::core::Executor;
use super::task::JoinHandle;
use crate::reactor::command::Command;
use crate::reactor::{Reactor, ReactorHandle};
use crate::utils::park;

use std::future::Future;

/// A running executor plus its reactor.
///
/// Dropping the runtime stops the workers and the reactor. Tasks that have
/// not finished by then are abandoned.
pub struct Runtime {
    executor: Executor,
    reactor_handle: ReactorHandle,
}

impl Runtime {
    pub(crate) fn new(worker_threads: usize) -> Self {
        let reactor_handle = Reactor::start();
        let executor = Executor::new(reactor_handle.clone(), worker_threads);

        Self {
            executor,
            reactor_handle,
        }
    }

    /// Spawns a future onto the worker pool.
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs `future` on the worker pool and parks the calling thread until
    /// it completes.
    ///
    /// A panic inside `future` is resumed on the calling thread.
    ///
    /// Must not be called from inside a task of the same runtime.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        park::block_on(self.spawn(future))
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.executor.shutdown();

        let _ = self.reactor_handle.send(Command::Shutdown);

        self.executor.join();
    }
}
