//! Bounded retry with jittered exponential backoff.

use std::thread;
use std::time::Duration;

use rand::Rng;

use super::error::RewriteError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 250;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

/// Retry policy for provider calls.
///
/// Only errors reporting [`RewriteError::is_retryable`] are retried, which
/// covers timeouts, connection failures, and 5xx responses. A 4xx response
/// is a configuration problem and fails on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` counts the first call and is raised
    /// to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Policy that makes exactly one attempt.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after `attempt` (1-based) failed.
    ///
    /// The exponential delay is capped at the maximum, then scaled into
    /// `[delay / 2, delay)` by `jitter`, which is clamped to `[0, 1)`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "jitter scales the delay")]
    pub fn backoff_delay(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let exponential = self
            .base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay);
        let factor = 0.5 + jitter.clamp(0.0, 0.999) / 2.0;
        exponential.mul_f64(factor)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. The operation receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub fn run<T>(
        &self,
        provider: &str,
        mut operation: impl FnMut(u32) -> Result<T, RewriteError>,
    ) -> Result<T, RewriteError> {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_delay(attempt, rand::thread_rng().r#gen::<f64>());
                    tracing::warn!(
                        provider,
                        attempt,
                        max_attempts = self.max_attempts,
                        ?delay,
                        "retrying rewrite request after transient failure: {error}"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use rstest::rstest;

    use super::RetryPolicy;
    use crate::rewrite::RewriteError;

    fn transient() -> RewriteError {
        RewriteError::Transport {
            message: "status 503".to_owned(),
            retryable: true,
        }
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[rstest]
    #[case(1, 0.0, 50)]
    #[case(1, 0.999, 100)]
    #[case(2, 0.0, 100)]
    #[case(3, 0.0, 200)]
    #[case(10, 0.0, 500)]
    fn backoff_grows_exponentially_up_to_the_cap(
        #[case] attempt: u32,
        #[case] jitter: f64,
        #[case] expected_floor_ms: u64,
    ) {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(1_000));

        let delay = policy.backoff_delay(attempt, jitter);

        assert!(delay >= Duration::from_millis(expected_floor_ms.saturating_sub(1)));
        assert!(delay <= Duration::from_millis(1_000));
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let calls = Cell::new(0);
        let result = quick_policy(3).run("test", |attempt| {
            calls.set(attempt);
            if attempt < 3 {
                Err(transient())
            } else {
                Ok("done")
            }
        });

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn attempts_stop_at_the_budget() {
        let calls = Cell::new(0);
        let result: Result<(), RewriteError> = quick_policy(2).run("test", |attempt| {
            calls.set(attempt);
            Err(transient())
        });

        assert_eq!(result, Err(transient()));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn configuration_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), RewriteError> = quick_policy(5).run("test", |attempt| {
            calls.set(attempt);
            Err(RewriteError::configuration("status 401"))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_attempts_still_makes_one_call() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts(), 1);
    }
}
