//! Retry schedule for refresh attempts.

use std::time::Duration;

/// Exponential retry policy.
///
/// Attempts are 0-indexed. After a failed attempt `a` that is not the last,
/// the caller waits `base_delay * 2^a` (capped at `max_delay`). No wait
/// follows the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Wait after failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another attempt follows failed attempt `attempt`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }

    /// Every wait of a run in which all attempts fail.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|a| self.delay_for_attempt(a))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_schedule_is_one_then_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::default().with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(5));
    }

    #[test]
    fn no_retry_has_empty_schedule() {
        assert!(RetryPolicy::no_retry().schedule().is_empty());
        assert!(RetryPolicy::default().with_max_attempts(0).schedule().is_empty());
    }

    proptest! {
        #[test]
        fn schedule_is_monotonic_and_bounded(max_attempts in 0u32..40, base_ms in 1u64..5_000) {
            let policy = RetryPolicy::default()
                .with_max_attempts(max_attempts)
                .with_base_delay(Duration::from_millis(base_ms));
            let schedule = policy.schedule();

            prop_assert_eq!(schedule.len() as u32, max_attempts.saturating_sub(1));
            for pair in schedule.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for d in &schedule {
                prop_assert!(*d <= policy.max_delay);
            }
        }
    }
}
