//! Cooperative cancellation.

use crate::sync::join_point::JoinPoint;
use crate::sync::Wait;
use crate::time::sleep;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A shareable cancellation signal.
///
/// Clones observe the same state. [`CancellationToken::none`] (also the
/// [`Default`]) can never be cancelled and costs nothing to check.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Option<Arc<JoinPoint>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Some(Arc::new(JoinPoint::new())),
        }
    }

    /// A token that is never cancelled.
    pub const fn none() -> Self {
        Self { inner: None }
    }

    /// Cancels the token. Calling it again, or on [`none`](Self::none), does
    /// nothing.
    pub fn cancel(&self) {
        if let Some(inner) = &self.inner
            && inner.complete()
        {
            tracing::trace!("cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.is_completed())
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.inner.is_some()
    }

    /// Resolves once the token is cancelled. Never resolves for
    /// [`none`](Self::none).
    pub fn cancelled(&self) -> Wait {
        match &self.inner {
            Some(inner) => Wait::new(inner.clone()),
            None => Wait::new(Arc::new(JoinPoint::new())),
        }
    }

    /// Cancels the token once `delay` has elapsed.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a runtime.
    pub fn cancel_after(&self, delay: Duration) {
        if !self.can_be_cancelled() {
            return;
        }

        let token = self.clone();
        crate::task::spawn(async move {
            sleep(delay).await;
            token.cancel();
        });
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("can_be_cancelled", &self.can_be_cancelled())
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.cancelled().is_finished());
    }

    #[test]
    fn none_is_never_cancelled() {
        let token = CancellationToken::none();
        token.cancel();

        assert!(!token.can_be_cancelled());
        assert!(!token.is_cancelled());
        assert!(!token.cancelled().is_finished());
        assert!(!CancellationToken::default().can_be_cancelled());
    }
}
