//! Retry executor with a fluent configuration API
//!
//! [`RetryExecutor`] drives an [`Attempt`] until it succeeds, the attempt
//! budget runs out or the [`ExceptionBehavior`] stops the run. Delays come
//! from a [`RetryStrategy`] and every pause goes through a [`WaitHandler`].

use crate::attempt::{Action, Attempt, Check, Until};
use crate::backoff::{BackoffPolicy, ConstantDelay, RetryStrategy};
use crate::behavior::{ExceptionBehavior, ExceptionDecision, RetryAll};
use crate::context::RetryContext;
use crate::error::RetryError;
use crate::policy::RetryPolicy;
use crate::wait::{TimerWaitHandler, WaitHandler};
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

/// Outcome of a retry run that did not end with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionState {
    /// An attempt succeeded
    Success,
    /// Every permitted attempt failed
    Failed,
    /// The exception behavior aborted the run
    Aborted,
}

/// Extension trait that adds `.retry()` to fallible actions
///
/// Implemented for every `FnMut() -> Result<(), E>`.
///
/// # Example
///
/// ```rust
/// use turtle_retry::{CompletionState, FnWaitHandler, Retryable};
///
/// let mut calls = 0;
/// let state = (|| {
///     calls += 1;
///     if calls < 3 { Err("not yet") } else { Ok(()) }
/// })
/// .retry()
/// .with_max_tries(5)
/// .with_wait_handler(FnWaitHandler(|_| {}))
/// .run();
///
/// assert_eq!(state.unwrap(), CompletionState::Success);
/// ```
pub trait Retryable<E>: Sized {
    /// Retry the action until it returns `Ok(())`.
    fn retry(self) -> RetryExecutor<Action<Self>>;

    /// Retry the action until `done` reports completion after a normal return.
    fn retry_until<P>(self, done: P) -> RetryExecutor<Until<Self, P>>
    where
        P: FnMut() -> bool;
}

impl<F, E> Retryable<E> for F
where
    F: FnMut() -> Result<(), E>,
{
    fn retry(self) -> RetryExecutor<Action<Self>> {
        RetryExecutor::new(Action(self))
    }

    fn retry_until<P>(self, done: P) -> RetryExecutor<Until<Self, P>>
    where
        P: FnMut() -> bool,
    {
        RetryExecutor::new(Until::new(self, done))
    }
}

/// Retry an action that succeeds when it returns `Ok(())`.
pub fn retry<F, E>(action: F) -> RetryExecutor<Action<F>>
where
    F: FnMut() -> Result<(), E>,
{
    RetryExecutor::new(Action(action))
}

/// Retry work that reports success as a boolean.
pub fn retry_check<F, E>(check: F) -> RetryExecutor<Check<F>>
where
    F: FnMut() -> Result<bool, E>,
{
    RetryExecutor::new(Check(check))
}

/// Retry an action until a separate predicate reports completion.
pub fn retry_until<F, P, E>(action: F, done: P) -> RetryExecutor<Until<F, P>>
where
    F: FnMut() -> Result<(), E>,
    P: FnMut() -> bool,
{
    RetryExecutor::new(Until::new(action, done))
}

/// Configured retry loop around a single unit of work
///
/// Configuration happens through the consuming `with_*` methods; running
/// consumes the executor, so a started run can no longer be reconfigured
/// and an executor never serves two runs.
///
/// # Type Parameters
///
/// * `A` - The attempt adapter
/// * `S` - The retry strategy (default: 100ms constant delay)
/// * `B` - The exception behavior (default: retry every error)
/// * `W` - The wait handler (default: real timers)
pub struct RetryExecutor<A, S = ConstantDelay, B = RetryAll, W = TimerWaitHandler> {
    attempt: A,
    schedule: Schedule<S, B>,
    wait_handler: W,
}

/// Loop state and the policies consulted between attempts.
struct Schedule<S, B> {
    context: RetryContext,
    max_tries: u32,
    strategy: S,
    behavior: B,
}

impl<S, B> Schedule<S, B>
where
    S: RetryStrategy,
{
    fn should_retry(&self, completion: CompletionState) -> bool {
        completion == CompletionState::Failed
            && (self.max_tries == 0 || self.context.count() < self.max_tries)
    }

    /// Classify one attempt outcome and record it in the context.
    fn settle<E>(&mut self, outcome: Result<bool, E>) -> Result<CompletionState, RetryError<E>>
    where
        B: ExceptionBehavior<E>,
    {
        let completion = match outcome {
            Ok(true) => CompletionState::Success,
            Ok(false) => CompletionState::Failed,
            Err(error) => match self.behavior.decide(&error) {
                ExceptionDecision::Retry => CompletionState::Failed,
                ExceptionDecision::Abort => CompletionState::Aborted,
                ExceptionDecision::Rethrow => {
                    warn!(
                        attempt = self.context.count().wrapping_add(1),
                        "attempt raised an error, rethrowing"
                    );
                    return Err(RetryError::Rethrown(error));
                }
            },
        };

        self.context.update();
        debug!(attempt = self.context.count(), ?completion, "attempt finished");
        if completion == CompletionState::Aborted {
            warn!(attempt = self.context.count(), "retry run aborted");
        }
        Ok(completion)
    }

    /// Delay before the next attempt, or `None` when no attempt follows.
    fn next_wait<E>(
        &mut self,
        completion: CompletionState,
    ) -> Result<Option<Duration>, RetryError<E>> {
        if !self.should_retry(completion) {
            if completion == CompletionState::Failed {
                info!(attempts = self.context.count(), "retry budget exhausted");
            }
            return Ok(None);
        }

        let delay = self.strategy.next_delay(&self.context);
        let period = delay.to_std().map_err(|_| {
            warn!(%delay, attempt = self.context.count(), "strategy returned a negative delay");
            RetryError::InvalidDelay(delay)
        })?;

        debug!(
            attempt = self.context.count(),
            delay_ms = period.as_millis() as u64,
            "waiting before next attempt"
        );
        Ok(Some(period))
    }
}

impl<A> RetryExecutor<A>
where
    A: Attempt,
{
    /// Create an executor with unlimited tries, a 100ms constant delay,
    /// [`RetryAll`] and timer-backed waits.
    pub fn new(attempt: A) -> Self {
        Self {
            attempt,
            schedule: Schedule {
                context: RetryContext::new(),
                max_tries: 0,
                strategy: ConstantDelay::default(),
                behavior: RetryAll,
            },
            wait_handler: TimerWaitHandler,
        }
    }
}

impl<A, S, B, W> RetryExecutor<A, S, B, W> {
    /// Limit the number of attempts; `0` means unlimited.
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.schedule.max_tries = max_tries;
        self
    }

    /// Replace the retry strategy.
    pub fn with_strategy<S2>(self, strategy: S2) -> RetryExecutor<A, S2, B, W>
    where
        S2: RetryStrategy,
    {
        let Schedule {
            context,
            max_tries,
            behavior,
            ..
        } = self.schedule;
        RetryExecutor {
            attempt: self.attempt,
            schedule: Schedule {
                context,
                max_tries,
                strategy,
                behavior,
            },
            wait_handler: self.wait_handler,
        }
    }

    /// Replace the policy applied to errors raised by attempts.
    ///
    /// # Example
    ///
    /// ```rust
    /// use turtle_retry::{retry, CompletionState, ExceptionDecision, FnWaitHandler};
    ///
    /// #[derive(Debug)]
    /// enum ApiError {
    ///     Timeout,
    ///     Unauthorized,
    /// }
    ///
    /// let result = retry(|| Err(ApiError::Unauthorized))
    ///     .with_exception_behavior(|error: &ApiError| match error {
    ///         ApiError::Timeout => ExceptionDecision::Retry,
    ///         ApiError::Unauthorized => ExceptionDecision::Abort,
    ///     })
    ///     .with_wait_handler(FnWaitHandler(|_| {}))
    ///     .run();
    ///
    /// assert_eq!(result.unwrap(), CompletionState::Aborted);
    /// ```
    pub fn with_exception_behavior<B2>(self, behavior: B2) -> RetryExecutor<A, S, B2, W> {
        let Schedule {
            context,
            max_tries,
            strategy,
            ..
        } = self.schedule;
        RetryExecutor {
            attempt: self.attempt,
            schedule: Schedule {
                context,
                max_tries,
                strategy,
                behavior,
            },
            wait_handler: self.wait_handler,
        }
    }

    /// Replace the wait handler, e.g. with a fake in tests.
    pub fn with_wait_handler<W2>(self, wait_handler: W2) -> RetryExecutor<A, S, B, W2>
    where
        W2: WaitHandler,
    {
        RetryExecutor {
            attempt: self.attempt,
            schedule: self.schedule,
            wait_handler,
        }
    }

    /// Apply a stored [`RetryPolicy`]: its attempt budget and strategy.
    pub fn with_policy(self, policy: RetryPolicy) -> RetryExecutor<A, BackoffPolicy, B, W> {
        self.with_strategy(policy.backoff)
            .with_max_tries(policy.max_tries)
    }

    /// Configured attempt budget (`0` is unlimited).
    pub fn max_tries(&self) -> u32 {
        self.schedule.max_tries
    }
}

impl<A, S, B, W> RetryExecutor<A, S, B, W>
where
    A: Attempt,
    S: RetryStrategy,
    B: ExceptionBehavior<A::Error>,
    W: WaitHandler,
{
    /// Run the loop on the calling thread, blocking during attempts and waits.
    ///
    /// # Errors
    ///
    /// - [`RetryError::Rethrown`] when the exception behavior rethrows.
    /// - [`RetryError::InvalidDelay`] when the strategy returns a negative
    ///   delay; no wait is attempted.
    pub fn run(self) -> Result<CompletionState, RetryError<A::Error>> {
        let Self {
            mut attempt,
            mut schedule,
            wait_handler,
        } = self;

        let mut completion = CompletionState::Failed;
        while schedule.should_retry(completion) {
            completion = schedule.settle(attempt.attempt())?;
            if let Some(period) = schedule.next_wait::<A::Error>(completion)? {
                wait_handler.wait_sync(period);
            }
        }

        Ok(completion)
    }
}

#[cfg(feature = "async")]
impl<A, S, B, W> RetryExecutor<A, S, B, W>
where
    A: Attempt + Send + 'static,
    A::Error: Send + 'static,
    S: RetryStrategy,
    B: ExceptionBehavior<A::Error>,
    W: WaitHandler,
{
    /// Run the loop without blocking the async runtime (requires `async` feature).
    ///
    /// Equivalent to [`RetryExecutor::run_async_with_cancel`] with a token
    /// that never fires.
    pub async fn run_async(self) -> Result<CompletionState, RetryError<A::Error>> {
        self.run_async_with_cancel(&CancellationToken::new()).await
    }

    /// Run the loop without blocking, honouring `cancel` (requires `async` feature).
    ///
    /// Each attempt runs on tokio's blocking pool and is awaited before the
    /// loop continues. Cancellation is checked before every attempt and
    /// interrupts a pending wait; an attempt already running is allowed to
    /// finish. A panic inside the work is resumed on the caller.
    ///
    /// # Errors
    ///
    /// Same as [`RetryExecutor::run`], plus [`RetryError::Cancelled`].
    pub async fn run_async_with_cancel(
        self,
        cancel: &CancellationToken,
    ) -> Result<CompletionState, RetryError<A::Error>> {
        let Self {
            mut attempt,
            mut schedule,
            wait_handler,
        } = self;

        let mut completion = CompletionState::Failed;
        while schedule.should_retry(completion) {
            if cancel.is_cancelled() {
                warn!(
                    attempts = schedule.context.count(),
                    "retry run cancelled before attempt"
                );
                return Err(RetryError::Cancelled);
            }

            let joined = tokio::task::spawn_blocking(move || {
                let outcome = attempt.attempt();
                (attempt, outcome)
            })
            .await;
            let outcome = match joined {
                Ok((returned, outcome)) => {
                    attempt = returned;
                    outcome
                }
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(_) => return Err(RetryError::Cancelled),
            };

            completion = schedule.settle(outcome)?;
            if let Some(period) = schedule.next_wait::<A::Error>(completion)? {
                wait_handler
                    .wait_async(period, cancel)
                    .await
                    .inspect_err(|_| {
                        warn!(
                            attempts = schedule.context.count(),
                            "retry run cancelled while waiting"
                        )
                    })?;
            }
        }

        Ok(completion)
    }
}
