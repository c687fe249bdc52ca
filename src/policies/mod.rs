//! Retry policies.
//!
//! This module groups the knobs that control **how long** to wait between
//! reconnect attempts.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (`first × 2^attempt + jitter`, capped at `max`)
//! - [`JitterPolicy`]  randomization added to every delay to decorrelate endpoints
//!
//! ## Quick wiring
//! ```text
//! RecoveryConfig { max_retries, initial_backoff, max_backoff, jitter }
//!      └─► recovery::RecoveryWatchdog uses:
//!           - BackoffPolicy::from(&RecoveryConfig)
//!           - backoff.next(retry_count) to arm the single retry timer
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=1s, max=30s, jitter=Uniform([0, 1s)).
//! - `JitterPolicy::None` is useful for tests and single-endpoint deployments.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
