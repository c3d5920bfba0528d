use super::container::ResultContainer;
use super::value_task::ValueTaskCompletionSource;
use crate::error::{Error, Result};
use crate::helpers::DisposeAction;
use crate::runtime::context;
use crate::sync::Mutex;
use crate::utils::park;

use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A zero-capacity hand-off between one producer and one consumer.
///
/// The producer publishes a value and then waits until the consumer has
/// taken it *and* released the [`ResultContainer`]. Exactly one value is
/// in flight at any time; backpressure comes from the producer waiting,
/// not from buffering.
///
/// Clones share the same channel.
pub struct RechargeableCompletionSource<T> {
    /// State shared by every clone and by live containers.
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    /// Slot the next value is published into.
    value: ValueTaskCompletionSource<T>,
    /// Generation of the most recently released container.
    released: parking_lot::Mutex<Released>,
    /// Serializes producers.
    producer: Mutex<()>,
    /// Set while a consumer is waiting or holds a container.
    value_in_work: AtomicBool,
}

#[derive(Default)]
struct Released {
    /// Containers are released in generation order, so a newer release
    /// overwrites any stale one nobody waited for.
    generation: Option<u16>,
    /// The producer waiting for its release.
    waker: Option<Waker>,
}

impl<T> Shared<T> {
    fn release(&self, generation: u16) {
        self.value_in_work.store(false, Ordering::Release);

        let waker = {
            let mut released = self.released.lock();
            released.generation = Some(generation);
            released.waker.take()
        };

        match waker {
            Some(waker) => waker.wake(),
            None => tracing::debug!(generation, "value released with no producer waiting"),
        }
    }

    fn poll_released(&self, generation: u16, cx: &mut Context<'_>) -> Poll<()> {
        let mut released = self.released.lock();

        if released.generation == Some(generation) {
            released.generation = None;
            return Poll::Ready(());
        }

        if !released.waker.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
            released.waker = Some(cx.waker().clone());
        }

        Poll::Pending
    }
}

impl<T: Send + 'static> RechargeableCompletionSource<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                value: ValueTaskCompletionSource::new(),
                released: parking_lot::Mutex::new(Released::default()),
                producer: Mutex::new(()),
                value_in_work: AtomicBool::new(false),
            }),
        }
    }

    /// Publishes `value` and blocks the calling thread until the consumer
    /// has released it.
    ///
    /// This parks the thread. Never call it from a task: on a runtime
    /// worker it stalls every task queued on that worker, and with a single
    /// worker it deadlocks. Use
    /// [`set_result_and_wait_async`](Self::set_result_and_wait_async) there.
    pub fn set_result_and_wait(&self, value: T) -> Result<()> {
        if context::on_worker_thread() {
            tracing::warn!(
                "set_result_and_wait called on a runtime worker thread; the worker is blocked until the value is released"
            );
        }

        park::block_on(self.set_result_and_wait_async(value))
    }

    /// Publishes `value` and suspends until the consumer has released it.
    ///
    /// Dropping this future after publishing does not withdraw the value.
    /// Its eventual release is recognised by generation and never completes
    /// a later producer.
    pub async fn set_result_and_wait_async(&self, value: T) -> Result<()> {
        let shared = &*self.shared;
        let _producer = shared.producer.lock().await;

        let generation = shared.value.version();
        shared.value.set_result(value)?;
        tracing::trace!(generation, "value published");

        future::poll_fn(|cx| shared.poll_released(generation, cx)).await;
        Ok(())
    }

    /// Waits for the next value.
    ///
    /// Fails at once with [`Error::InvalidOperation`] while an earlier
    /// container is alive or another consumer is still waiting.
    pub fn get_value(&self) -> Result<GetValue<T>> {
        if self
            .shared
            .value_in_work
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::InvalidOperation(
                "result container was already taken but not released",
            ));
        }

        Ok(GetValue {
            token: self.shared.value.version(),
            shared: Some(self.shared.clone()),
        })
    }
}

impl<T: Send + 'static> Default for RechargeableCompletionSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RechargeableCompletionSource<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for RechargeableCompletionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RechargeableCompletionSource")
            .field(
                "value_in_work",
                &self.shared.value_in_work.load(Ordering::Acquire),
            )
            .finish_non_exhaustive()
    }
}

/// Future returned by [`RechargeableCompletionSource::get_value`].
///
/// Dropping it before it resolves gives up the consumer slot.
#[must_use = "futures do nothing unless polled"]
pub struct GetValue<T> {
    /// Taken once the future resolves.
    shared: Option<Arc<Shared<T>>>,

    /// Value generation current when the consumer slot was claimed.
    token: u16,
}

impl<T: Send + 'static> Future for GetValue<T> {
    type Output = Result<ResultContainer<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let Some(shared) = this.shared.as_ref() else {
            panic!("`GetValue` polled after completion");
        };

        let result = match shared.value.source().poll_result(this.token, cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };

        let Some(shared) = this.shared.take() else {
            unreachable!();
        };

        match result {
            Ok(value) => {
                let generation = this.token;
                let release = DisposeAction::new(move || shared.release(generation));

                Poll::Ready(Ok(ResultContainer::new(value, release)))
            }
            Err(err) => {
                shared.value_in_work.store(false, Ordering::Release);
                Poll::Ready(Err(err))
            }
        }
    }
}

impl<T> fmt::Debug for GetValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetValue")
            .field("token", &self.token)
            .field("resolved", &self.shared.is_none())
            .finish()
    }
}

impl<T> Drop for GetValue<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.value_in_work.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RechargeableCompletionSource;

    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    #[test]
    fn second_consumer_is_rejected_until_release() {
        let source = RechargeableCompletionSource::<u32>::new();

        let pending = source.get_value().unwrap();
        assert!(source.get_value().unwrap_err().is_invalid_operation());

        drop(pending);
        assert!(source.get_value().is_ok());
    }

    #[test]
    fn async_producer_waits_for_release() {
        let source = RechargeableCompletionSource::new();
        let mut cx = Context::from_waker(Waker::noop());

        let mut produce = pin!(source.set_result_and_wait_async("hello"));
        assert!(produce.as_mut().poll(&mut cx).is_pending());

        let mut consume = pin!(source.get_value().unwrap());
        let Poll::Ready(Ok(container)) = consume.as_mut().poll(&mut cx) else {
            panic!("value should be published");
        };
        assert_eq!(*container, "hello");

        assert!(produce.as_mut().poll(&mut cx).is_pending());
        assert!(source.get_value().is_err());

        container.release();
        assert!(matches!(produce.as_mut().poll(&mut cx), Poll::Ready(Ok(()))));
        assert!(source.get_value().is_ok());
    }

    #[test]
    fn abandoned_producer_release_does_not_complete_the_next_one() {
        let source = RechargeableCompletionSource::new();
        let mut cx = Context::from_waker(Waker::noop());

        let mut first = Box::pin(source.set_result_and_wait_async("a"));
        assert!(first.as_mut().poll(&mut cx).is_pending());

        let mut consume = pin!(source.get_value().unwrap());
        let Poll::Ready(Ok(container)) = consume.as_mut().poll(&mut cx) else {
            panic!("first value should be published");
        };
        drop(first);

        let mut second = pin!(source.set_result_and_wait_async("b"));
        assert!(second.as_mut().poll(&mut cx).is_pending());

        container.release();
        assert!(second.as_mut().poll(&mut cx).is_pending());

        let mut consume = pin!(source.get_value().unwrap());
        let Poll::Ready(Ok(container)) = consume.as_mut().poll(&mut cx) else {
            panic!("second value should be published");
        };
        assert_eq!(*container, "b");
        assert!(second.as_mut().poll(&mut cx).is_pending());

        container.release();
        assert!(matches!(second.as_mut().poll(&mut cx), Poll::Ready(Ok(()))));
    }
}
