//! Errors that escape a retry run.
//!
//! Transient failures and aborts are reported through
//! [`CompletionState`](crate::CompletionState); only the conditions below
//! terminate a run with an error.

use chrono::TimeDelta;

/// Fatal outcome of a retry run
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The exception behavior chose to rethrow the error raised by an attempt.
    #[error("attempt raised an error that was not retried: {0}")]
    Rethrown(E),

    /// The retry strategy produced a negative delay.
    #[error("retry strategy produced a negative delay ({0})")]
    InvalidDelay(TimeDelta),

    /// The run was cancelled before an attempt or while waiting.
    #[error("retry run was cancelled")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// Recover the original error of a [`RetryError::Rethrown`].
    pub fn into_rethrown(self) -> Option<E> {
        match self {
            RetryError::Rethrown(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }
}

/// Returned by [`WaitHandler::wait_async`](crate::WaitHandler::wait_async)
/// when the cancellation token fires before the wait completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wait was cancelled")]
pub struct WaitCancelled;

impl<E> From<WaitCancelled> for RetryError<E> {
    fn from(_: WaitCancelled) -> Self {
        RetryError::Cancelled
    }
}
