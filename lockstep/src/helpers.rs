//! Small RAII helpers.

use std::fmt;

/// Runs a closure exactly once, either on [`dispose`](Self::dispose) or on
/// drop.
///
/// This is the release half of every handle the crate hands out: lock
/// holds, rendezvous containers, reader counts.
pub struct DisposeAction {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl DisposeAction {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Runs the action now. Later calls, and the eventual drop, do nothing.
    pub fn dispose(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.action.is_none()
    }

    /// Drops the action without running it.
    pub fn forget(mut self) {
        self.action = None;
    }
}

impl Drop for DisposeAction {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeAction")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::DisposeAction;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<AtomicUsize>, DisposeAction) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let action = DisposeAction::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (calls, action)
    }

    #[test]
    fn runs_once_on_repeated_dispose() {
        let (calls, mut action) = counting();

        action.dispose();
        action.dispose();
        drop(action);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runs_on_drop() {
        let (calls, action) = counting();
        assert!(!action.is_disposed());

        drop(action);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forget_skips_the_action() {
        let (calls, action) = counting();

        action.forget();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
