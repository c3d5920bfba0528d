use crate::reactor::ReactorHandle;
use crate::runtime::context::RuntimeContext;
use crate::runtime::executor::worker::Worker;
use crate::runtime::task::{JoinHandle, Task};
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle as ThreadHandle};

/// Owns the worker threads of a runtime.
pub(crate) struct Executor {
    injector: Arc<Injector>,
    handles: Vec<ThreadHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl Executor {
    /// Spawns `threads` workers, each with its own local queue and the
    /// runtime context installed.
    pub(crate) fn new(reactor: ReactorHandle, threads: usize) -> Self {
        let injector = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Arc<Vec<Arc<LocalQueue>>> =
            Arc::new((0..threads).map(|_| Arc::new(LocalQueue::new())).collect());

        let context = RuntimeContext {
            reactor,
            injector: injector.clone(),
            locals,
        };

        let handles = (0..threads)
            .map(|id| {
                let worker = Worker::new(id, context.clone());
                let shutdown = shutdown.clone();

                thread::Builder::new()
                    .name(format!("lockstep-worker-{id}"))
                    .spawn(move || worker.run(shutdown))
                    .expect("failed to spawn a worker thread")
            })
            .collect();

        Self {
            injector,
            handles,
            shutdown,
        }
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.injector.shutdown();
    }

    /// Queues `future` on the global injector.
    ///
    /// After shutdown the task is never polled and its handle never
    /// resolves.
    pub(crate) fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task = Arc::new(Task::new(future, self.injector.clone()));

        if !self.shutdown.load(Ordering::Acquire) {
            self.injector.push(task.clone());
        }

        JoinHandle { task }
    }

    pub(crate) fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
