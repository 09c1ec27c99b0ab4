//! Policies deciding what happens after an attempt raised an error.

/// Verdict on an error raised by an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionDecision {
    /// Treat the attempt as a transient failure and keep going
    Retry,
    /// Stop cleanly; the run completes as [`CompletionState::Aborted`](crate::CompletionState::Aborted)
    Abort,
    /// Stop and hand the original error back to the caller
    Rethrow,
}

/// Policy consulted exactly once for every error an attempt raises.
///
/// It is never called for successful attempts or for attempts that simply
/// reported `false`. Any `FnMut(&E) -> ExceptionDecision` closure is a
/// behavior, which covers classification by error kind:
///
/// ```rust
/// use turtle_retry::{ExceptionBehavior, ExceptionDecision};
///
/// #[derive(Debug)]
/// enum FetchError {
///     Timeout,
///     NotFound,
/// }
///
/// let mut behavior = |error: &FetchError| match error {
///     FetchError::Timeout => ExceptionDecision::Retry,
///     FetchError::NotFound => ExceptionDecision::Rethrow,
/// };
/// assert_eq!(behavior.decide(&FetchError::NotFound), ExceptionDecision::Rethrow);
/// ```
pub trait ExceptionBehavior<E> {
    /// Decide how the run continues after `error`.
    fn decide(&mut self, error: &E) -> ExceptionDecision;
}

impl<E, F> ExceptionBehavior<E> for F
where
    F: FnMut(&E) -> ExceptionDecision,
{
    fn decide(&mut self, error: &E) -> ExceptionDecision {
        self(error)
    }
}

/// Retries every error. This is the executor's default behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAll;

impl<E> ExceptionBehavior<E> for RetryAll {
    fn decide(&mut self, _error: &E) -> ExceptionDecision {
        ExceptionDecision::Retry
    }
}

/// Hands every error straight back to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RethrowAll;

impl<E> ExceptionBehavior<E> for RethrowAll {
    fn decide(&mut self, _error: &E) -> ExceptionDecision {
        ExceptionDecision::Rethrow
    }
}

/// Retries raised errors until the `limit`th one, which aborts the run.
///
/// A limit of 0 or 1 aborts on the first error.
#[derive(Debug, Clone, Copy)]
pub struct AbortAfter {
    limit: u32,
    seen: u32,
}

impl AbortAfter {
    pub fn new(limit: u32) -> Self {
        Self { limit, seen: 0 }
    }

    /// Number of errors observed so far.
    pub fn seen(&self) -> u32 {
        self.seen
    }
}

impl<E> ExceptionBehavior<E> for AbortAfter {
    fn decide(&mut self, _error: &E) -> ExceptionDecision {
        self.seen = self.seen.saturating_add(1);
        if self.seen >= self.limit {
            ExceptionDecision::Abort
        } else {
            ExceptionDecision::Retry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_all() {
        let mut behavior = RetryAll;
        assert_eq!(behavior.decide(&"boom"), ExceptionDecision::Retry);
        assert_eq!(behavior.decide(&42), ExceptionDecision::Retry);
    }

    #[test]
    fn test_rethrow_all() {
        let mut behavior = RethrowAll;
        assert_eq!(behavior.decide(&"boom"), ExceptionDecision::Rethrow);
    }

    #[test]
    fn test_abort_after_limit() {
        let mut behavior = AbortAfter::new(3);
        assert_eq!(behavior.decide(&()), ExceptionDecision::Retry);
        assert_eq!(behavior.decide(&()), ExceptionDecision::Retry);
        assert_eq!(behavior.decide(&()), ExceptionDecision::Abort);
        assert_eq!(behavior.seen(), 3);
    }

    #[test]
    fn test_abort_after_zero_aborts_immediately() {
        let mut behavior = AbortAfter::new(0);
        assert_eq!(behavior.decide(&()), ExceptionDecision::Abort);
    }

    #[test]
    fn test_closure_behavior_classifies() {
        let mut behavior = |code: &u16| {
            if *code >= 500 {
                ExceptionDecision::Retry
            } else {
                ExceptionDecision::Abort
            }
        };
        assert_eq!(behavior.decide(&503u16), ExceptionDecision::Retry);
        assert_eq!(behavior.decide(&404u16), ExceptionDecision::Abort);
    }
}
