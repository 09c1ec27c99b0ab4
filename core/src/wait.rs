//! Wait abstraction used between two attempts
//!
//! All time-dependent behaviour of a retry run goes through [`WaitHandler`],
//! so swapping the handler makes a run fully deterministic.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::error::WaitCancelled;
#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

/// Trait for pausing before the next attempt
///
/// - `wait_sync` blocks the calling thread and is used by
///   [`RetryExecutor::run`](crate::RetryExecutor::run).
/// - `wait_async` suspends the task and must resolve early with
///   [`WaitCancelled`] once the token fires (requires the `async` feature).
#[cfg_attr(feature = "async", async_trait::async_trait)]
pub trait WaitHandler: Send + Sync {
    /// Block for `period`.
    fn wait_sync(&self, period: Duration);

    /// Suspend for `period`, or until `cancel` fires.
    #[cfg(feature = "async")]
    async fn wait_async(
        &self,
        period: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), WaitCancelled>;
}

/// Timer-backed handler used by default
///
/// Blocks with `std::thread::sleep` and waits asynchronously with
/// `tokio::time::sleep`, raced against the cancellation token.
///
/// # Example
///
/// ```rust
/// use turtle_retry::{TimerWaitHandler, WaitHandler};
/// use std::time::Duration;
///
/// TimerWaitHandler.wait_sync(Duration::from_millis(5));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerWaitHandler;

#[cfg_attr(feature = "async", async_trait::async_trait)]
impl WaitHandler for TimerWaitHandler {
    fn wait_sync(&self, period: Duration) {
        std::thread::sleep(period);
    }

    #[cfg(feature = "async")]
    async fn wait_async(
        &self,
        period: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), WaitCancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WaitCancelled),
            _ = tokio::time::sleep(period) => Ok(()),
        }
    }
}

/// Function pointer handler for custom waits
///
/// Both variants call the function; the async one still reports
/// cancellation when the token has fired. `FnWaitHandler(|_| {})` skips
/// waiting entirely, which is what most tests want.
///
/// # Example
///
/// ```rust
/// use turtle_retry::{FnWaitHandler, WaitHandler};
/// use std::time::Duration;
///
/// fn log_wait(period: Duration) {
///     println!("would wait {period:?}");
/// }
///
/// FnWaitHandler(log_wait).wait_sync(Duration::from_secs(1));
/// ```
#[derive(Clone, Copy)]
pub struct FnWaitHandler(pub fn(Duration));

#[cfg_attr(feature = "async", async_trait::async_trait)]
impl WaitHandler for FnWaitHandler {
    fn wait_sync(&self, period: Duration) {
        (self.0)(period);
    }

    #[cfg(feature = "async")]
    async fn wait_async(
        &self,
        period: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), WaitCancelled> {
        if cancel.is_cancelled() {
            return Err(WaitCancelled);
        }
        (self.0)(period);
        if cancel.is_cancelled() {
            Err(WaitCancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg_attr(feature = "async", async_trait::async_trait)]
impl<W> WaitHandler for Arc<W>
where
    W: WaitHandler + ?Sized,
{
    fn wait_sync(&self, period: Duration) {
        (**self).wait_sync(period);
    }

    #[cfg(feature = "async")]
    async fn wait_async(
        &self,
        period: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), WaitCancelled> {
        (**self).wait_async(period, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_timer_wait_sync() {
        let start = Instant::now();
        TimerWaitHandler.wait_sync(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_fn_wait_handler() {
        fn test_wait(period: Duration) {
            assert_eq!(period, Duration::from_millis(100));
        }

        FnWaitHandler(test_wait).wait_sync(Duration::from_millis(100));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timer_wait_async_completes() {
        let token = CancellationToken::new();
        let start = Instant::now();
        let result = TimerWaitHandler
            .wait_async(Duration::from_millis(10), &token)
            .await;
        assert_eq!(result, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timer_wait_async_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result = TimerWaitHandler
            .wait_async(Duration::from_secs(60), &token)
            .await;
        assert_eq!(result, Err(WaitCancelled));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timer_wait_async_interrupted() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = TimerWaitHandler
            .wait_async(Duration::from_secs(60), &token)
            .await;
        assert_eq!(result, Err(WaitCancelled));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_fn_wait_handler_honors_token() {
        let token = CancellationToken::new();
        let handler = Arc::new(FnWaitHandler(|_| {}));
        assert_eq!(handler.wait_async(Duration::from_secs(1), &token).await, Ok(()));

        token.cancel();
        assert_eq!(
            handler.wait_async(Duration::from_secs(1), &token).await,
            Err(WaitCancelled)
        );
    }
}
