use std::time::Duration;

use tracing::{debug, trace};

use crate::attempt::Attempt;
use crate::config::TimerConfig;
use crate::context::RetryContext;
use crate::error::RetryError;

/// Initial backoff interval used by [`ExpTimer::default`]
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
/// Growth factor used by [`ExpTimer::default`]
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Exponential backoff timer.
///
/// Every call to [`next_duration`](Self::next_duration) hands out the current
/// interval and then multiplies it, so with a multiplier of at least 1.0 the
/// sequence never shrinks. The timer is also an endless [`Iterator`] over that
/// sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpTimer {
    interval: Duration,
    multiplier: f64,
}

impl Default for ExpTimer {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_INTERVAL, DEFAULT_MULTIPLIER)
    }
}

impl ExpTimer {
    /// Creates a timer starting at `interval` and growing by `multiplier`.
    ///
    /// Settings are taken as given; use [`TimerConfig::build`] for validated
    /// construction.
    #[must_use]
    pub const fn new(interval: Duration, multiplier: f64) -> Self {
        Self {
            interval,
            multiplier,
        }
    }

    /// Creates a timer from a [`TimerConfig`] without re-validating it.
    #[must_use]
    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(config.interval(), config.multiplier())
    }

    /// The interval the next call to [`next_duration`](Self::next_duration) returns
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// The growth factor
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns the current interval and advances to the next one.
    pub fn next_duration(&mut self) -> Duration {
        let current = self.interval;
        self.interval = scale(current, self.multiplier);
        trace!(current = ?current, next = ?self.interval, "backoff interval advanced");
        current
    }

    /// Blocks the calling thread for [`next_duration`](Self::next_duration).
    pub fn sleep(&mut self) {
        std::thread::sleep(self.next_duration());
    }

    /// Calls `operation` until it finishes, backing off between attempts.
    ///
    /// After every [`Attempt::Retry`] the context is checked first: a cancelled
    /// or expired context ends the loop without sleeping. Otherwise the thread
    /// sleeps for the next interval. The sleep itself is not interrupted by
    /// cancellation; use [`retry_async`](Self::retry_async) for that.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Operation`] with the operation's own error, or
    /// [`RetryError::Context`] when the context was cancelled or timed out.
    pub fn retry<T, E, F>(
        &mut self,
        ctx: &RetryContext,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Attempt<T, E>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            if let Attempt::Finish(result) = operation() {
                return result.map_err(RetryError::Operation);
            }

            if let Some(err) = ctx.err() {
                debug!(attempt, error = %err, "retry loop stopped by context");
                return Err(err.into());
            }

            debug!(attempt, delay = ?self.interval, "backing off before next attempt");
            self.sleep();
        }
    }
}

impl Iterator for ExpTimer {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_duration())
    }
}

/// Runs [`ExpTimer::retry`] on a fresh [`ExpTimer::default`].
///
/// # Errors
///
/// See [`ExpTimer::retry`].
pub fn retry<T, E, F>(ctx: &RetryContext, operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Attempt<T, E>,
{
    ExpTimer::default().retry(ctx, operation)
}

// `as` saturates: NaN and negative products become zero, overflow becomes
// u64::MAX nanoseconds.
fn scale(interval: Duration, multiplier: f64) -> Duration {
    let next = Duration::from_nanos((interval.as_nanos() as f64 * multiplier) as u64);
    if multiplier >= 1.0 {
        next.max(interval)
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_keeps_settings() {
        let t = ExpTimer::new(Duration::from_secs(1), 2.0);
        assert_eq!(t.interval(), Duration::from_secs(1));
        assert_eq!(t.multiplier(), 2.0);
    }

    #[test]
    fn default_settings() {
        assert_eq!(
            ExpTimer::default(),
            ExpTimer::new(DEFAULT_INITIAL_INTERVAL, DEFAULT_MULTIPLIER)
        );
    }

    #[test]
    fn doubling_sequence() {
        let mut t = ExpTimer::new(Duration::from_nanos(1), 2.0);
        let mut expected = 1u64;
        for _ in 0..10 {
            assert_eq!(t.next_duration(), Duration::from_nanos(expected));
            expected *= 2;
        }
        assert_eq!(t.interval(), Duration::from_nanos(1024));
    }

    #[test]
    fn fractional_multiplier_truncates() {
        let mut t = ExpTimer::default();
        let seq: Vec<_> = t.by_ref().take(4).collect();
        assert_eq!(
            seq,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(750),
                Duration::from_millis(1125),
                Duration::from_micros(1_687_500),
            ]
        );
        assert_eq!(t.interval(), Duration::from_micros(2_531_250));
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let mut t = ExpTimer::new(Duration::from_secs(u64::MAX / 1_000_000_000), 1e6);
        t.next_duration();
        assert_eq!(t.interval(), Duration::from_nanos(u64::MAX));
        t.next_duration();
        assert_eq!(t.interval(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn degenerate_multipliers() {
        let mut shrinking = ExpTimer::new(Duration::from_millis(10), 0.5);
        shrinking.next_duration();
        assert_eq!(shrinking.interval(), Duration::from_millis(5));

        let mut nan = ExpTimer::new(Duration::from_millis(10), f64::NAN);
        nan.next_duration();
        assert_eq!(nan.interval(), Duration::ZERO);

        let mut flat = ExpTimer::new(Duration::from_millis(10), 1.0);
        assert_eq!(flat.next_duration(), flat.next_duration());
    }

    #[test]
    fn sleep_advances_timer() {
        let mut t = ExpTimer::new(Duration::from_millis(1), 3.0);
        t.sleep();
        assert_eq!(t.interval(), Duration::from_millis(3));
    }

    #[test]
    fn immediate_finish_does_not_sleep() {
        let mut t = ExpTimer::new(Duration::from_secs(3600), 2.0);
        let out: Result<u8, RetryError<()>> =
            t.retry(&RetryContext::background(), || Attempt::done(42));
        assert_eq!(out.unwrap(), 42);
        assert_eq!(t.interval(), Duration::from_secs(3600));
    }

    #[test]
    fn cancelled_context_skips_sleep() {
        let ctx = RetryContext::background();
        ctx.cancel();

        let mut calls = 0;
        let mut t = ExpTimer::new(Duration::from_secs(3600), 2.0);
        let out: Result<(), RetryError<()>> = t.retry(&ctx, || {
            calls += 1;
            Attempt::Retry
        });

        assert!(out.unwrap_err().is_cancelled());
        assert_eq!(calls, 1);
        assert_eq!(t.interval(), Duration::from_secs(3600));
    }

    proptest! {
        /// With a multiplier of at least 1.0 the sequence never shrinks
        #[test]
        fn prop_non_decreasing(
            start_ns in 0u64..=3_600_000_000_000,
            multiplier in 1.0f64..8.0,
            steps in 1usize..64,
        ) {
            let mut t = ExpTimer::new(Duration::from_nanos(start_ns), multiplier);
            let mut prev = t.next_duration();
            for _ in 0..steps {
                let next = t.next_duration();
                prop_assert!(next >= prev, "{next:?} < {prev:?}");
                prev = next;
            }
        }
    }
}
