//! # Backoff policy for reconnect attempts.
//!
//! [`BackoffPolicy`] controls how the delay before a reconnect attempt grows
//! after repeated failures. It is parameterized by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::jitter`] the random component added on every call.
//!
//! The delay for attempt `n` is computed as `min(first × 2^n + jitter, max)`.
//! The base is derived purely from the attempt number, so a previous jittered
//! value never feeds into the next one.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use sessionvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(1000),
//!     max: Duration::from_secs(30),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(1000));
//! assert_eq!(backoff.next(3), Duration::from_millis(8000));
//! // 1s × 2^10 = 1024s → capped at max
//! assert_eq!(backoff.next(10), Duration::from_secs(30));
//! ```

use std::time::Duration;

use crate::config::RecoveryConfig;
use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first retry (attempt 0).
    pub first: Duration,
    /// Maximum delay cap, applied after jitter.
    pub max: Duration,
    /// Jitter policy to prevent thundering herd.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with `first = 1s`, `max = 30s` and uniform jitter in `[0, 1s)`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::default(),
        }
    }
}

impl From<&RecoveryConfig> for BackoffPolicy {
    fn from(cfg: &RecoveryConfig) -> Self {
        Self {
            first: cfg.initial_backoff,
            max: cfg.max_backoff,
            jitter: cfg.jitter,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed), drawing a
    /// fresh jitter sample.
    pub fn next(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, self.jitter.sample())
    }

    /// Computes the delay for `attempt` with an explicit jitter value.
    ///
    /// Deterministic: the same inputs always give the same output. The result
    /// is never above [`BackoffPolicy::max`]; any overflow of the exponential
    /// base saturates to `max`.
    pub fn delay_with(&self, attempt: u32, jitter: Duration) -> Duration {
        let max_ms = self.max.as_millis();
        let base_ms = 1u128
            .checked_shl(attempt)
            .and_then(|mult| self.first.as_millis().checked_mul(mult));

        let total_ms = match base_ms {
            Some(base) => base.saturating_add(jitter.as_millis()),
            None => return self.max,
        };
        if total_ms >= max_ms {
            return self.max;
        }
        Duration::from_millis(u64::try_from(total_ms).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            jitter,
        }
    }

    #[test]
    fn test_attempt_zero_returns_first() {
        let p = policy(1000, 30_000, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(1000));
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let p = policy(100, 30_000, JitterPolicy::None);

        assert_eq!(p.next(0), Duration::from_millis(100));
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(2), Duration::from_millis(400));
        assert_eq!(p.next(3), Duration::from_millis(800));
        assert_eq!(p.next(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_jitter_is_added_before_cap() {
        let p = policy(1000, 30_000, JitterPolicy::None);
        assert_eq!(
            p.delay_with(1, Duration::from_millis(250)),
            Duration::from_millis(2250)
        );
        // 16s + 999ms stays under the cap, 32s does not.
        assert_eq!(
            p.delay_with(4, Duration::from_millis(999)),
            Duration::from_millis(16_999)
        );
        assert_eq!(
            p.delay_with(5, Duration::from_millis(1)),
            Duration::from_millis(30_000)
        );
    }

    #[test]
    fn test_deterministic_given_jitter() {
        let p = policy(1000, 30_000, JitterPolicy::default());
        let j = Duration::from_millis(417);
        for attempt in 0..=10 {
            assert_eq!(p.delay_with(attempt, j), p.delay_with(attempt, j));
        }
    }

    #[test]
    fn test_bounds_for_small_attempts() {
        let p = policy(1000, 30_000, JitterPolicy::default());
        for attempt in 0..=10 {
            for _ in 0..50 {
                let d = p.next(attempt);
                assert!(
                    d <= Duration::from_millis(30_000 + 1000),
                    "attempt {attempt}: {d:?} above bound"
                );
                assert!(d >= Duration::from_millis(1000).min(p.max));
            }
        }
    }

    #[test]
    fn test_non_decreasing_until_clamped() {
        let p = policy(1000, 30_000, JitterPolicy::None);
        let mut prev = Duration::ZERO;
        for attempt in 0..=10 {
            let d = p.next(attempt);
            assert!(d >= prev, "attempt {attempt}: {d:?} < {prev:?}");
            prev = d;
        }
        assert_eq!(prev, Duration::from_millis(30_000));
    }

    #[test]
    fn test_first_exceeds_max() {
        let p = policy(10_000, 5_000, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(5_000));
    }

    #[test]
    fn test_huge_attempt_clamps_to_max() {
        let p = policy(100, 60_000, JitterPolicy::None);
        assert_eq!(p.next(100), Duration::from_secs(60));
        assert_eq!(p.next(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_first_yields_jitter_only() {
        let p = policy(0, 30_000, JitterPolicy::None);
        assert_eq!(
            p.delay_with(7, Duration::from_millis(300)),
            Duration::from_millis(300)
        );
    }
}
