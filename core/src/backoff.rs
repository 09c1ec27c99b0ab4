//! Retry strategies that compute the delay before the next attempt
//!
//! A strategy is consulted by the executor after a failed attempt has been
//! recorded in the [`RetryContext`], so the first delay of a run is computed
//! against `count == 1`.

use crate::context::RetryContext;
use chrono::TimeDelta;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Trait for strategies that calculate the pause between two attempts
pub trait RetryStrategy {
    /// Compute the delay to wait before the next attempt.
    ///
    /// The result is signed so that misbehaving strategies can be detected:
    /// the executor rejects a negative delay with
    /// [`RetryError::InvalidDelay`](crate::RetryError::InvalidDelay) instead
    /// of waiting.
    fn next_delay(&mut self, context: &RetryContext) -> TimeDelta;
}

impl<F> RetryStrategy for F
where
    F: FnMut(&RetryContext) -> TimeDelta,
{
    fn next_delay(&mut self, context: &RetryContext) -> TimeDelta {
        self(context)
    }
}

/// Constant delay strategy
///
/// Every retry waits the same amount of time, regardless of how many
/// attempts have been made.
///
/// # Example
///
/// ```rust
/// use turtle_retry::{ConstantDelay, RetryContext, RetryStrategy};
///
/// let mut strategy = ConstantDelay::new().delay_ms(1337);
/// let delay = strategy.next_delay(&RetryContext::new());
/// assert_eq!(delay.num_milliseconds(), 1337);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantDelay {
    /// Fixed delay between attempts
    pub delay: TimeDelta,
}

impl ConstantDelay {
    /// Create a constant delay strategy with the default 100ms delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay
    pub fn delay(mut self, delay: TimeDelta) -> Self {
        self.delay = delay;
        self
    }

    /// Set the delay in milliseconds
    pub fn delay_ms(self, ms: u64) -> Self {
        self.delay(millis(ms))
    }
}

impl Default for ConstantDelay {
    fn default() -> Self {
        Self {
            delay: TimeDelta::milliseconds(100),
        }
    }
}

impl RetryStrategy for ConstantDelay {
    fn next_delay(&mut self, _context: &RetryContext) -> TimeDelta {
        self.delay
    }
}

/// Capped exponential backoff
///
/// Delays grow as `base_delay * 2^count` until they reach `max_delay`. Once
/// the cap has been hit the strategy latches: every later call on the same
/// instance returns `max_delay`, even if the attempt counter wraps around to
/// a small value.
///
/// # Example
///
/// ```rust
/// use turtle_retry::{ExponentialBackoff, RetryContext, RetryStrategy};
///
/// let mut backoff = ExponentialBackoff::new()
///     .base_delay_ms(50)
///     .max_delay_ms(150);
///
/// let delays: Vec<i64> = (1..=4)
///     .map(|count| backoff.next_delay(&RetryContext::with_count(count)).num_milliseconds())
///     .collect();
/// assert_eq!(delays, vec![100, 150, 150, 150]);
///
/// // Latched: a wrapped counter does not bring the short delays back.
/// let delay = backoff.next_delay(&RetryContext::with_count(0));
/// assert_eq!(delay.num_milliseconds(), 150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Delay used for `count == 0`
    pub base_delay: TimeDelta,
    /// Upper bound for any computed delay
    pub max_delay: TimeDelta,
    capped: bool,
}

impl ExponentialBackoff {
    /// Create an exponential backoff with default values (100ms base, 2 minute cap)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base delay
    pub fn base_delay(mut self, delay: TimeDelta) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the base delay in milliseconds
    pub fn base_delay_ms(self, ms: u64) -> Self {
        self.base_delay(millis(ms))
    }

    /// Set the maximum delay cap
    pub fn max_delay(mut self, delay: TimeDelta) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the maximum delay cap in milliseconds
    pub fn max_delay_ms(self, ms: u64) -> Self {
        self.max_delay(millis(ms))
    }

    /// Whether this instance has latched onto `max_delay`.
    pub fn is_capped(&self) -> bool {
        self.capped
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay: TimeDelta::milliseconds(100),
            max_delay: TimeDelta::minutes(2),
            capped: false,
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&mut self, context: &RetryContext) -> TimeDelta {
        if self.capped {
            return self.max_delay;
        }

        let base = as_nanos(self.base_delay);
        let scaled = if base == 0 {
            Some(0)
        } else {
            2i128
                .checked_pow(context.count())
                .and_then(|factor| factor.checked_mul(base))
        };

        match scaled {
            Some(nanos) if nanos < as_nanos(self.max_delay) => from_nanos(nanos),
            _ => {
                self.capped = true;
                self.max_delay
            }
        }
    }
}

/// Strategy that can represent any of the built-in variants.
///
/// The enum form lets a strategy live inside a [`RetryPolicy`](crate::RetryPolicy)
/// or registry without boxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Constant delay strategy
    Constant(ConstantDelay),
    /// Capped exponential backoff
    Exponential(ExponentialBackoff),
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Constant(ConstantDelay::default())
    }
}

impl RetryStrategy for BackoffPolicy {
    fn next_delay(&mut self, context: &RetryContext) -> TimeDelta {
        match self {
            BackoffPolicy::Constant(strategy) => strategy.next_delay(context),
            BackoffPolicy::Exponential(strategy) => strategy.next_delay(context),
        }
    }
}

impl From<ConstantDelay> for BackoffPolicy {
    fn from(value: ConstantDelay) -> Self {
        BackoffPolicy::Constant(value)
    }
}

impl From<ExponentialBackoff> for BackoffPolicy {
    fn from(value: ExponentialBackoff) -> Self {
        BackoffPolicy::Exponential(value)
    }
}

fn millis(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

fn as_nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SEC + i128::from(delta.subsec_nanos())
}

fn from_nanos(nanos: i128) -> TimeDelta {
    let fallback = if nanos < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    };
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let subsec = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    i64::try_from(secs)
        .ok()
        .and_then(|secs| TimeDelta::new(secs, subsec))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn ms(value: i64) -> TimeDelta {
        TimeDelta::milliseconds(value)
    }

    #[test]
    fn test_constant_ignores_context() {
        let mut strategy = ConstantDelay::new().delay_ms(1337);

        for count in [0, 1, 2, 17, u32::MAX] {
            assert_eq!(strategy.next_delay(&RetryContext::with_count(count)), ms(1337));
        }
        assert_eq!(strategy.next_delay(&RetryContext::new()), ms(1337));
    }

    #[test]
    fn test_constant_default() {
        assert_eq!(ConstantDelay::default().delay, ms(100));
    }

    #[test]
    fn test_exponential_builder() {
        let backoff = ExponentialBackoff::new()
            .base_delay_ms(200)
            .max_delay(TimeDelta::seconds(5));

        assert_eq!(backoff.base_delay, ms(200));
        assert_eq!(backoff.max_delay, TimeDelta::seconds(5));
        assert!(!backoff.is_capped());
    }

    #[test]
    fn test_exponential_first_try_returns_base_delay() {
        let mut backoff = ExponentialBackoff::new().base_delay_ms(200);
        assert_eq!(backoff.next_delay(&RetryContext::new()), ms(200));
    }

    #[test]
    fn test_exponential_doubles_per_attempt() {
        let mut context = RetryContext::new();
        let mut backoff = ExponentialBackoff::new();

        context.update();
        assert_eq!(backoff.next_delay(&context), ms(200));
        context.update();
        assert_eq!(backoff.next_delay(&context), ms(400));
        context.update();
        assert_eq!(backoff.next_delay(&context), ms(800));
        assert!(!backoff.is_capped());
    }

    #[test]
    fn test_exponential_never_exceeds_max() {
        let mut backoff = ExponentialBackoff::new().max_delay_ms(500);
        assert_eq!(backoff.next_delay(&RetryContext::with_count(3)), ms(500));
        assert!(backoff.is_capped());
    }

    #[test]
    fn test_exponential_counter_at_max_returns_max_delay() {
        let mut backoff = ExponentialBackoff::new();
        let delay = backoff.next_delay(&RetryContext::with_count(u32::MAX));
        assert_eq!(delay, TimeDelta::minutes(2));
    }

    #[test]
    fn test_exponential_stays_capped_after_counter_wraps() {
        let mut backoff = ExponentialBackoff::new();
        let mut context = RetryContext::with_count(u32::MAX);

        backoff.next_delay(&context);
        context.update();
        assert_eq!(context.count(), 0);

        assert_eq!(backoff.next_delay(&context), TimeDelta::minutes(2));
        assert_eq!(
            backoff.next_delay(&RetryContext::with_count(1)),
            TimeDelta::minutes(2)
        );
    }

    #[test]
    fn test_exponential_zero_base_stays_zero() {
        let mut backoff = ExponentialBackoff::new().base_delay(TimeDelta::zero());
        assert_eq!(
            backoff.next_delay(&RetryContext::with_count(200)),
            TimeDelta::zero()
        );
        assert!(!backoff.is_capped());
    }

    #[test]
    fn test_exponential_matches_capped_formula() {
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..500 {
            let base_ms: u64 = rng.random_range(1..=1_000);
            let max_ms: u64 = rng.random_range(1..=600_000);
            let count: u32 = rng.random_range(0..=80);

            let expected = 2u128
                .checked_pow(count)
                .and_then(|factor| factor.checked_mul(u128::from(base_ms)))
                .map_or(max_ms, |value| value.min(u128::from(max_ms)) as u64);

            let mut backoff = ExponentialBackoff::new()
                .base_delay_ms(base_ms)
                .max_delay_ms(max_ms);
            let delay = backoff.next_delay(&RetryContext::with_count(count));
            assert_eq!(
                delay,
                ms(expected as i64),
                "base {base_ms}ms, max {max_ms}ms, count {count}"
            );
        }
    }

    #[test]
    fn test_exponential_non_decreasing_then_sticky() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut backoff = ExponentialBackoff::new().base_delay_ms(10).max_delay_ms(10_000);

        let mut previous = TimeDelta::zero();
        for count in 0..=10 {
            let delay = backoff.next_delay(&RetryContext::with_count(count));
            assert!(delay >= previous);
            previous = delay;
        }
        assert!(backoff.is_capped());

        for _ in 0..100 {
            let count: u32 = rng.random();
            assert_eq!(
                backoff.next_delay(&RetryContext::with_count(count)),
                ms(10_000)
            );
        }
    }

    #[test]
    fn test_closure_strategy() {
        let mut strategy = |context: &RetryContext| ms(i64::from(context.count()) * 10);
        assert_eq!(strategy.next_delay(&RetryContext::with_count(4)), ms(40));
    }

    #[test]
    fn test_backoff_policy_dispatch() {
        let mut constant = BackoffPolicy::from(ConstantDelay::new().delay_ms(250));
        assert_eq!(constant.next_delay(&RetryContext::with_count(9)), ms(250));

        let mut exponential =
            BackoffPolicy::from(ExponentialBackoff::new().base_delay_ms(1).max_delay_ms(3));
        assert_eq!(exponential.next_delay(&RetryContext::with_count(1)), ms(2));
        assert_eq!(exponential.next_delay(&RetryContext::with_count(2)), ms(3));
        assert_eq!(exponential.next_delay(&RetryContext::with_count(0)), ms(3));

        assert_eq!(BackoffPolicy::default(), BackoffPolicy::Constant(ConstantDelay::default()));
    }
}
