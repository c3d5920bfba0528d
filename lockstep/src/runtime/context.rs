use crate::reactor::ReactorHandle;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

/// Handles a worker installs before polling any task.
#[derive(Clone)]
pub(crate) struct RuntimeContext {
    pub(crate) reactor: ReactorHandle,
    pub(crate) injector: InjectorHandle,
    pub(crate) locals: Arc<Vec<Arc<LocalQueue>>>,
}

thread_local! {
    /// Reactor of the runtime whose task is being polled on this thread.
    pub(crate) static CURRENT_REACTOR: RefCell<Option<ReactorHandle>> =
        const { RefCell::new(None) };

    /// Global queue of the current runtime.
    pub(crate) static CURRENT_INJECTOR: RefCell<Option<InjectorHandle>> =
        const { RefCell::new(None) };

    /// Index of the worker owning this thread, if it is a worker.
    pub(crate) static CURRENT_WORKER_ID: RefCell<Option<usize>> =
        const { RefCell::new(None) };

    /// Every worker's local queue, indexed by worker id.
    pub(crate) static CURRENT_LOCALS: RefCell<Option<Arc<Vec<Arc<LocalQueue>>>>> =
        const { RefCell::new(None) };
}

/// Runs `f` with `context` installed in the thread-locals, restoring the
/// previous values afterwards.
pub(crate) fn enter_context<R>(context: &RuntimeContext, f: impl FnOnce() -> R) -> R {
    let prev_reactor = CURRENT_REACTOR.with(|r| r.replace(Some(context.reactor.clone())));
    let prev_injector = CURRENT_INJECTOR.with(|i| i.replace(Some(context.injector.clone())));
    let prev_locals = CURRENT_LOCALS.with(|l| l.replace(Some(context.locals.clone())));

    let out = f();

    CURRENT_LOCALS.with(|l| l.replace(prev_locals));
    CURRENT_INJECTOR.with(|i| i.replace(prev_injector));
    CURRENT_REACTOR.with(|r| r.replace(prev_reactor));

    out
}

/// Returns `true` when called from one of the runtime's worker threads.
pub(crate) fn on_worker_thread() -> bool {
    CURRENT_WORKER_ID.with(|id| id.borrow().is_some())
}
