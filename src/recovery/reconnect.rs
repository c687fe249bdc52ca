//! # Reconnect callback seam.
//!
//! The watchdog never talks to the session layer directly: it is handed one
//! [`Reconnect`] reference at construction. `Ok(())` only means a new session
//! attempt was *started*; real success arrives out-of-band through
//! `on_connected` / `on_sharing_restored`. An `Err` counts as a failed attempt.
//!
//! ## Example
//! ```rust
//! use sessionvisor::{ReconnectFn, ReconnectRef, SessionError};
//!
//! let r: ReconnectRef = ReconnectFn::arc(|| async {
//!     Err::<(), _>(SessionError::NotInitialized)
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;

/// Starts a new session attempt on behalf of the watchdog.
#[async_trait]
pub trait Reconnect: Send + Sync + 'static {
    /// Issues one reconnect attempt.
    async fn reconnect(&self) -> Result<(), SessionError>;
}

/// Shared reconnect handle.
pub type ReconnectRef = Arc<dyn Reconnect>;

/// Closure-backed [`Reconnect`]; produces a fresh future per attempt.
pub struct ReconnectFn<F> {
    f: F,
}

impl<F> ReconnectFn<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Reconnect for ReconnectFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SessionError>> + Send + 'static,
{
    async fn reconnect(&self) -> Result<(), SessionError> {
        (self.f)().await
    }
}
