//! Async retry loop that races the backoff sleep against cancellation.

use std::future::Future;

use tracing::debug;

use crate::attempt::Attempt;
use crate::context::RetryContext;
use crate::error::RetryError;
use crate::timer::ExpTimer;

impl ExpTimer {
    /// Sleeps on the tokio timer for [`next_duration`](Self::next_duration).
    pub async fn sleep_async(&mut self) {
        tokio::time::sleep(self.next_duration()).await;
    }

    /// Async counterpart of [`retry`](Self::retry).
    ///
    /// The backoff sleep is raced against [`RetryContext::done`], so a
    /// cancellation or deadline that fires mid-sleep ends the loop right away.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Operation`] with the operation's own error, or
    /// [`RetryError::Context`] when the context was cancelled or timed out.
    pub async fn retry_async<T, E, F, Fut>(
        &mut self,
        ctx: &RetryContext,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            if let Attempt::Finish(result) = operation().await {
                return result.map_err(RetryError::Operation);
            }

            if let Some(err) = ctx.err() {
                debug!(attempt, error = %err, "retry loop stopped by context");
                return Err(err.into());
            }

            let delay = self.next_duration();
            debug!(attempt, delay = ?delay, "backing off before next attempt");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                err = ctx.done() => {
                    debug!(attempt, error = %err, "backoff interrupted by context");
                    return Err(err.into());
                }
            }
        }
    }
}

/// Runs [`ExpTimer::retry_async`] on a fresh [`ExpTimer::default`].
///
/// # Errors
///
/// See [`ExpTimer::retry_async`].
pub async fn retry_async<T, E, F, Fut>(
    ctx: &RetryContext,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    ExpTimer::default().retry_async(ctx, operation).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_async_uses_next_duration() {
        let mut t = ExpTimer::new(Duration::from_secs(4), 2.0);
        let start = Instant::now();
        t.sleep_async().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_millis(4010));
        assert_eq!(t.interval(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_long_sleep() {
        let ctx = RetryContext::background();
        let handle = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        });

        let start = Instant::now();
        let mut t = ExpTimer::new(Duration::from_secs(3600), 2.0);
        let out: Result<(), RetryError<()>> =
            t.retry_async(&ctx, || async { Attempt::Retry }).await;

        assert!(out.unwrap_err().is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(3600));
    }
}
