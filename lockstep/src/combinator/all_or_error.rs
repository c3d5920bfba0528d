use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Waits for every future to succeed, or for the first one to fail.
///
/// Successful outputs come back in input order. On the first `Err` the
/// combinator resolves immediately with it; the remaining futures are
/// dropped with the combinator. An empty input resolves to `Ok(vec![])`.
pub fn when_all_or_error<I, F, T, E>(futures: I) -> WhenAllOrError<F, T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let pending: Vec<_> = futures.into_iter().map(|f| Some(Box::pin(f))).collect();
    let results = pending.iter().map(|_| None).collect();

    WhenAllOrError {
        remaining: pending.len(),
        pending,
        results,
    }
}

/// Future returned by [`when_all_or_error`].
#[must_use = "futures do nothing unless polled"]
pub struct WhenAllOrError<F, T> {
    pending: Vec<Option<Pin<Box<F>>>>,
    results: Vec<Option<T>>,
    remaining: usize,
}

// Futures are boxed; nothing is structurally pinned.
impl<F, T> Unpin for WhenAllOrError<F, T> {}

impl<F, T, E> Future for WhenAllOrError<F, T>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<Vec<T>, E>;

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

            match output {
                Ok(value) => {
                    *result = Some(value);
                    this.remaining -= 1;
                }
                Err(err) => return Poll::Ready(Err(err)),
            }
        }

        if this.remaining > 0 {
            return Poll::Pending;
        }

        Poll::Ready(Ok(this.results.iter_mut().filter_map(Option::take).collect()))
    }
}
