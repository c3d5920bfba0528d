use super::with_cancellation;
use crate::CancellationToken;
use crate::error::{Error, Result};
use crate::time::sleep;

use std::future::Future;
use std::time::Duration;

/// Reports whether `future` finishes within `timeout`.
///
/// The delay starts when this function is called. The future is checked
/// before the delay, so one that is already complete always reports
/// `true`. Cancelling `token` ends the delay early, which reports `false`.
/// The future itself is dropped if it loses.
///
/// Fails with [`Error::InvalidArgument`] for a zero `timeout`.
pub fn try_execute_with_timeout<F>(
    future: F,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<impl Future<Output = bool> + use<F>>
where
    F: Future,
{
    if timeout.is_zero() {
        return Err(Error::invalid_argument("timeout", "must be positive"));
    }

    let delay = with_cancellation(sleep(timeout), token);

    Ok(async move {
        lockstep_macros::select! {
            future => |_| true,
            delay => |_| false,
        }
    })
}
