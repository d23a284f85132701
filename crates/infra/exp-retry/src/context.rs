//! Cancellation and deadline signal for retry loops.
//!
//! A [`RetryContext`] pairs a [`CancellationToken`] with an optional deadline.
//! Contexts derived with [`RetryContext::with_timeout`],
//! [`RetryContext::with_deadline`] or [`RetryContext::child`] are cancelled
//! when their parent is, but cancelling them leaves the parent untouched.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

/// Cancellation token plus optional deadline.
///
/// Clones share the same token, so cancelling one clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RetryContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Wraps an existing token. The context has no deadline.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derived context that also expires `timeout` from now.
    ///
    /// A timeout too large to represent leaves the inherited deadline as is.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => self.with_deadline(at),
            None => self.child(),
        }
    }

    /// Derived context that expires at `at`, or at the inherited deadline if
    /// that comes first.
    #[must_use]
    pub fn with_deadline(&self, at: impl Into<Instant>) -> Self {
        let at = at.into();
        let deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Derived context with the same deadline and its own cancellation.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is no longer live, or `None` while it still is.
    ///
    /// Explicit cancellation is reported in preference to an expired deadline.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(at) => tokio::select! {
                biased;
                () = self.token.cancelled() => ContextError::Cancelled,
                () = tokio::time::sleep_until(at) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}
