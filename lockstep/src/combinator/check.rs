use crate::error::{Error, Result};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Drives every future to completion, calling `on_faulted` as soon as the
/// first one fails.
///
/// Unlike [`when_all_or_error`](super::when_all_or_error) this never
/// abandons the rest: the returned future resolves only after all inputs
/// finished, with their outputs in input order or with the first error.
/// `on_faulted` runs at most once.
///
/// Fails with [`Error::InvalidArgument`] when `futures` is empty.
pub fn wait_all_tasks_but_check<I, F, T, E, C>(
    futures: I,
    on_faulted: C,
) -> Result<WaitAllButCheck<F, T, E, C>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = std::result::Result<T, E>>,
    C: FnOnce(),
{
    let pending: Vec<_> = futures.into_iter().map(|f| Some(Box::pin(f))).collect();

    if pending.is_empty() {
        return Err(Error::invalid_argument("futures", "must not be empty"));
    }

    Ok(WaitAllButCheck {
        results: pending.iter().map(|_| None).collect(),
        remaining: pending.len(),
        pending,
        first_error: None,
        on_faulted: Some(on_faulted),
    })
}

/// Future returned by [`wait_all_tasks_but_check`].
#[must_use = "futures do nothing unless polled"]
pub struct WaitAllButCheck<F, T, E, C> {
    pending: Vec<Option<Pin<Box<F>>>>,
    results: Vec<Option<T>>,
    remaining: usize,
    first_error: Option<E>,
    on_faulted: Option<C>,
}

// Futures are boxed; nothing is structurally pinned.
impl<F, T, E, C> Unpin for WaitAllButCheck<F, T, E, C> {}

impl<F, T, E, C> Future for WaitAllButCheck<F, T, E, C>
where
    F: Future<Output = std::result::Result<T, E>>,
    C: FnOnce(),
{
    type Output = std::result::Result<Vec<T>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        for (slot, result) in this.pending.iter_mut().zip(this.results.iter_mut()) {
            let Some(future) = slot else {
                continue;
            };

            let Poll::Ready(output) = future.as_mut().poll(cx) else {
                continue;
            };

            *slot = None;
            this.remaining -= 1;

            match output {
                Ok(value) => *result = Some(value),
                Err(err) if this.first_error.is_none() => {
                    this.first_error = Some(err);

                    if let Some(on_faulted) = this.on_faulted.take() {
                        tracing::debug!("first fault observed, notifying");
                        on_faulted();
                    }
                }
                Err(_) => {}
            }
        }

        if this.remaining > 0 {
            return Poll::Pending;
        }

        Poll::Ready(match this.first_error.take() {
            Some(err) => Err(err),
            None => Ok(this.results.iter_mut().filter_map(Option::take).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::wait_all_tasks_but_check;

    use std::cell::Cell;
    use std::future::{Future, pending, ready};
    use std::pin::{Pin, pin};
    use std::task::{Context, Poll, Waker};

    type Boxed = Pin<Box<dyn Future<Output = Result<u32, &'static str>>>>;

    #[test]
    fn empty_input_is_rejected() {
        let err = wait_all_tasks_but_check(Vec::<Boxed>::new(), || {}).err().unwrap();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn callback_runs_once_and_first_error_is_kept() {
        let calls = Cell::new(0);
        let mut cx = Context::from_waker(Waker::noop());

        let futures: Vec<Boxed> = vec![
            Box::pin(ready(Err("first"))),
            Box::pin(ready(Ok(2))),
            Box::pin(ready(Err("second"))),
        ];

        let all = pin!(wait_all_tasks_but_check(futures, || calls.set(calls.get() + 1)).unwrap());
        assert!(matches!(all.poll(&mut cx), Poll::Ready(Err("first"))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn callback_fires_while_others_are_still_running() {
        let calls = Cell::new(0);
        let mut cx = Context::from_waker(Waker::noop());

        let futures: Vec<Boxed> = vec![Box::pin(pending()), Box::pin(ready(Err("broken")))];

        let mut all =
            pin!(wait_all_tasks_but_check(futures, || calls.set(calls.get() + 1)).unwrap());
        assert!(all.as_mut().poll(&mut cx).is_pending());
        assert_eq!(calls.get(), 1);

        assert!(all.as_mut().poll(&mut cx).is_pending());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn successes_keep_input_order() {
        let mut cx = Context::from_waker(Waker::noop());
        let futures: Vec<Boxed> = vec![Box::pin(ready(Ok(5))), Box::pin(ready(Ok(6)))];

        let all = pin!(wait_all_tasks_but_check(futures, || panic!("no fault")).unwrap());
        assert!(matches!(all.poll(&mut cx), Poll::Ready(Ok(v)) if v == vec![5, 6]));
    }
}
