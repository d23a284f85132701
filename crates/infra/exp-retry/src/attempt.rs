/// Report returned by one call of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Attempt<T, E> {
    /// Back off and call the operation again
    Retry,
    /// Stop retrying and hand this result to the caller
    Finish(Result<T, E>),
}

impl<T, E> Attempt<T, E> {
    /// Stop with a successful value.
    pub const fn done(value: T) -> Self {
        Self::Finish(Ok(value))
    }

    /// Stop with an error.
    pub const fn fail(err: E) -> Self {
        Self::Finish(Err(err))
    }

    /// Retry when `result` is an error accepted by `retryable`, finish otherwise.
    pub fn retry_if(result: Result<T, E>, retryable: impl FnOnce(&E) -> bool) -> Self {
        if let Err(e) = &result
            && retryable(e)
        {
            return Self::Retry;
        }
        Self::Finish(result)
    }

    /// Returns `true` for [`Attempt::Retry`].
    #[must_use]
    pub const fn is_retry(&self) -> bool {
        matches!(self, Self::Retry)
    }
}

impl<T, E> From<Result<T, E>> for Attempt<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self::Finish(result)
    }
}
