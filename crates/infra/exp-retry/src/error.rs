use thiserror::Error;

/// Reason a [`RetryContext`](crate::RetryContext) stopped being live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled explicitly
    #[error("context canceled")]
    Cancelled,

    /// The context deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error returned by a retry loop.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation finished with an error; it is passed through unchanged
    #[error(transparent)]
    Operation(E),

    /// The context was cancelled or timed out between attempts
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl<E> RetryError<E> {
    /// Returns `true` if the loop stopped because the context was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Context(ContextError::Cancelled))
    }

    /// Returns `true` if the loop stopped because the context deadline passed.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Context(ContextError::DeadlineExceeded))
    }

    /// Returns the operation error, if that is what ended the loop.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Context(_) => None,
        }
    }

    /// Returns the context error, if that is what ended the loop.
    #[must_use]
    pub const fn context_error(&self) -> Option<ContextError> {
        match self {
            Self::Operation(_) => None,
            Self::Context(e) => Some(*e),
        }
    }
}

/// Invalid timer settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Multiplier below 1.0, NaN or infinite
    #[error("Invalid multiplier {0}: must be finite and at least 1.0")]
    Multiplier(f64),

    /// An environment override could not be parsed
    #[error("Invalid value for {var}: {reason}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Parse failure
        reason: String,
    },
}
