use crate::runtime::task::Task;

use std::sync::Arc;
use std::task::{Wake, Waker};

impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        Task::schedule(self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Task::schedule(self.clone());
    }
}

/// Builds the waker handed to a task's future while it is polled.
///
/// Waking it reschedules the task through [`Task::schedule`].
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    Waker::from(task)
}
