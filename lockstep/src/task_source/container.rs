use crate::helpers::DisposeAction;

use std::fmt;
use std::ops::Deref;

/// A value handed over by a [`RechargeableCompletionSource`].
///
/// The producer that published the value stays blocked until the container
/// is released, either explicitly or by dropping it.
///
/// [`RechargeableCompletionSource`]: super::RechargeableCompletionSource
pub struct ResultContainer<T> {
    /// The consumed value.
    value: T,

    /// Lets the producer continue. Runs on [`release`](Self::release) or
    /// drop.
    release: DisposeAction,
}

impl<T> ResultContainer<T> {
    pub(crate) fn new(value: T, release: DisposeAction) -> Self {
        Self { value, release }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Releases the producer and keeps the value.
    pub fn into_value(self) -> T {
        let Self { value, release } = self;
        drop(release);
        value
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for ResultContainer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for ResultContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultContainer")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ResultContainer;
    use crate::helpers::DisposeAction;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn container(value: &'static str) -> (Arc<AtomicUsize>, ResultContainer<&'static str>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = releases.clone();
        let release = DisposeAction::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        (releases, ResultContainer::new(value, release))
    }

    #[test]
    fn drop_releases_once() {
        let (releases, container) = container("payload");

        assert_eq!(*container, "payload");
        assert_eq!(container.value().len(), 7);
        drop(container);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn into_value_releases_and_keeps_the_value() {
        let (releases, container) = container("kept");

        assert_eq!(container.into_value(), "kept");
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
