use crate::runtime::context::{CURRENT_WORKER_ID, RuntimeContext, enter_context};
use crate::runtime::task::Runnable;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One worker thread's view of the pool.
///
/// Lookup order for the next task: own queue, global injector, siblings
/// (round-robin starting after `id`). With nothing to do the worker parks
/// on the injector.
pub(crate) struct Worker {
    id: usize,
    context: RuntimeContext,
}

impl Worker {
    pub(crate) fn new(id: usize, context: RuntimeContext) -> Self {
        Self { id, context }
    }

    pub(crate) fn run(&self, shutdown: Arc<AtomicBool>) {
        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = Some(self.id));
        tracing::trace!(worker = self.id, "worker started");

        enter_context(&self.context, || {
            while !shutdown.load(Ordering::Acquire) {
                match self.next_task() {
                    Some(task) => task.run(),
                    None => self.context.injector.park(),
                }
            }
        });

        tracing::trace!(worker = self.id, "worker stopped");
    }

    fn next_task(&self) -> Option<Arc<dyn Runnable>> {
        self.context.locals[self.id]
            .pop()
            .or_else(|| self.context.injector.steal())
            .or_else(|| self.try_steal())
    }

    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let locals = &self.context.locals;
        let len = locals.len();

        (1..len)
            .map(|offset| (self.id + offset) % len)
            .find_map(|victim| locals[victim].steal())
    }
}
