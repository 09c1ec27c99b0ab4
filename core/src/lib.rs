//! turtle-retry - retry execution engine
//!
//! Repeatedly invokes a unit of work until it succeeds, an attempt budget is
//! exhausted or an exception policy aborts the run, pausing between attempts
//! for a strategy-computed delay. Runs are available in a blocking and a
//! cancellable non-blocking flavour.
//!
//! # Building blocks
//!
//! - [`Attempt`]: normalizes plain actions, boolean checks and
//!   action-plus-predicate pairs into one "did it succeed" operation
//! - [`RetryStrategy`]: computes the next delay from the [`RetryContext`]
//! - [`ExceptionBehavior`]: turns a raised error into an [`ExceptionDecision`]
//! - [`WaitHandler`]: performs the pause; swap it out for deterministic tests
//! - [`RetryExecutor`]: the retry loop itself
//!
//! # Example
//!
//! ```rust
//! use turtle_retry::{retry, CompletionState, ExponentialBackoff, FnWaitHandler};
//!
//! let mut calls = 0;
//! let state = retry(|| {
//!     calls += 1;
//!     if calls < 3 { Err("flaky") } else { Ok(()) }
//! })
//! .with_max_tries(5)
//! .with_strategy(ExponentialBackoff::new().base_delay_ms(50).max_delay_ms(1_000))
//! .with_wait_handler(FnWaitHandler(|_| {}))
//! .run()?;
//!
//! assert_eq!(state, CompletionState::Success);
//! # Ok::<(), turtle_retry::RetryError<&str>>(())
//! ```
//!
//! # Features
//!
//! - `async` (default): `run_async`/`run_async_with_cancel` on top of tokio,
//!   with cancellation through `tokio_util::sync::CancellationToken`

pub mod attempt;
pub mod backoff;
pub mod behavior;
pub mod context;
pub mod dsl;
pub mod error;
pub mod policy;
pub mod retry;
pub mod wait;

pub use attempt::{Action, Attempt, Check, Until};
pub use backoff::{BackoffPolicy, ConstantDelay, ExponentialBackoff, RetryStrategy};
pub use behavior::{AbortAfter, ExceptionBehavior, ExceptionDecision, RethrowAll, RetryAll};
pub use context::RetryContext;
pub use dsl::{DslError, builder_for_policy, retry_with_policy};
pub use error::{RetryError, WaitCancelled};
pub use policy::{
    PolicyRegistry, RetryPolicy, clear_global_policies, get_global_policy, list_global_policies,
    register_global_policy, remove_global_policy,
};
pub use retry::{CompletionState, RetryExecutor, Retryable, retry, retry_check, retry_until};
pub use wait::{FnWaitHandler, TimerWaitHandler, WaitHandler};

#[cfg(feature = "async")]
pub use tokio_util::sync::CancellationToken;
