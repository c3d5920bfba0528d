use super::join_point::{JoinPoint, Wait};
use crate::error::{Error, Result};

use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::Arc;

/// Releases waiters one at a time, strictly in the order they queued.
///
/// Every [`wait`](Self::wait) takes a place in line; every
/// [`finish_task`](Self::finish_task) lets the oldest place go. A place
/// whose future was dropped still consumes one release.
#[derive(Default)]
pub struct ContinuationQueue {
    queue: Mutex<VecDeque<Arc<JoinPoint>>>,
}

impl ContinuationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(&self) -> Wait {
        let point = Arc::new(JoinPoint::new());
        self.queue.lock().push_back(point.clone());
        Wait::new(point)
    }

    pub fn finish_task(&self) -> Result<()> {
        let Some(next) = self.queue.lock().pop_front() else {
            return Err(Error::InvalidOperation("continuation queue is empty"));
        };

        next.complete();
        tracing::trace!("continuation released");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl std::fmt::Debug for ContinuationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuationQueue")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ContinuationQueue;

    #[test]
    fn releases_in_fifo_order() {
        let queue = ContinuationQueue::new();

        let first = queue.wait();
        let second = queue.wait();
        assert_eq!(queue.len(), 2);

        queue.finish_task().unwrap();
        assert!(first.is_finished());
        assert!(!second.is_finished());

        queue.finish_task().unwrap();
        assert!(second.is_finished());
        assert!(queue.is_empty());
    }

    #[test]
    fn finishing_an_empty_queue_fails() {
        let queue = ContinuationQueue::new();
        assert!(queue.finish_task().unwrap_err().is_invalid_operation());
    }
}
