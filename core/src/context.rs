//! Attempt bookkeeping shared between the executor and retry strategies.

use chrono::{DateTime, Utc};

/// Mutable attempt counter owned by a single retry run.
///
/// The executor calls [`RetryContext::update`] once per completed attempt,
/// after the attempt and before the next delay is computed. Strategies only
/// ever see a shared reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryContext {
    count: u32,
    last_tried: Option<DateTime<Utc>>,
}

impl RetryContext {
    /// Create a context for a run that has not attempted anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context positioned at an arbitrary attempt count.
    ///
    /// Handy for driving a [`RetryStrategy`](crate::RetryStrategy) directly,
    /// e.g. to check its behaviour near `u32::MAX`.
    pub fn with_count(count: u32) -> Self {
        Self {
            count,
            last_tried: Some(Utc::now()),
        }
    }

    /// Number of attempts completed so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// When the most recent attempt completed, if any.
    pub fn last_tried(&self) -> Option<DateTime<Utc>> {
        self.last_tried
    }

    /// Record one completed attempt.
    ///
    /// The counter wraps on overflow so unlimited runs never panic.
    pub fn update(&mut self) {
        self.count = self.count.wrapping_add(1);
        self.last_tried = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_empty() {
        let context = RetryContext::new();
        assert_eq!(context.count(), 0);
        assert!(context.last_tried().is_none());
    }

    #[test]
    fn test_update_increments_and_stamps() {
        let mut context = RetryContext::new();
        let before = Utc::now();

        context.update();
        assert_eq!(context.count(), 1);
        let first = context.last_tried().unwrap();
        assert!(first >= before);

        context.update();
        context.update();
        assert_eq!(context.count(), 3);
        assert!(context.last_tried().unwrap() >= first);
    }

    #[test]
    fn test_update_wraps_at_max() {
        let mut context = RetryContext::with_count(u32::MAX);
        context.update();
        assert_eq!(context.count(), 0);
        assert!(context.last_tried().is_some());
    }
}
