//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that many endpoints
//! losing connectivity at the same moment do not reconnect in lockstep.
//!
//! - [`JitterPolicy::None`] no randomization, predictable delays
//! - [`JitterPolicy::Uniform`] adds a value drawn uniformly from `[0, span)`

use rand::Rng;
use std::time::Duration;

/// Policy controlling the random component added to every retry delay.
///
/// The jitter is **additive**: it is drawn independently on every call and
/// added on top of the exponential base before the result is capped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact exponential delay.
    ///
    /// Use when:
    /// - Only one endpoint is retrying (no herd risk)
    /// - Predictable timing is required (tests, debugging)
    None,

    /// Uniform jitter in `[0, span)`.
    Uniform {
        /// Exclusive upper bound of the random component.
        span: Duration,
    },
}

impl Default for JitterPolicy {
    /// Returns `Uniform { span: 1s }`.
    fn default() -> Self {
        JitterPolicy::Uniform {
            span: Duration::from_secs(1),
        }
    }
}

impl JitterPolicy {
    /// Draws one jitter sample.
    ///
    /// Always `< span` for [`JitterPolicy::Uniform`]; a zero span yields zero.
    pub fn sample(&self) -> Duration {
        match self {
            JitterPolicy::None => Duration::ZERO,
            JitterPolicy::Uniform { span } => {
                let span_ms = u64::try_from(span.as_millis()).unwrap_or(u64::MAX);
                if span_ms == 0 {
                    return Duration::ZERO;
                }
                let mut rng = rand::rng();
                Duration::from_millis(rng.random_range(0..span_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_always_zero() {
        for _ in 0..10 {
            assert_eq!(JitterPolicy::None.sample(), Duration::ZERO);
        }
    }

    #[test]
    fn uniform_stays_below_span() {
        let policy = JitterPolicy::Uniform {
            span: Duration::from_millis(1000),
        };
        for _ in 0..500 {
            assert!(policy.sample() < Duration::from_millis(1000));
        }
    }

    #[test]
    fn zero_span_does_not_panic() {
        let policy = JitterPolicy::Uniform {
            span: Duration::ZERO,
        };
        assert_eq!(policy.sample(), Duration::ZERO);
    }
}
