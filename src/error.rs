//! Error types used by the sessionvisor runtime.
//!
//! This module defines three error enums:
//!
//! - [`CapabilityError`]: a call into the vendor session capability was rejected.
//! - [`SessionError`]: errors surfaced by the session orchestrator entry points.
//! - [`RuntimeError`]: errors raised by the runtime itself (signals, shutdown).
//!
//! Each provides `as_label` for logs and [`SessionError::is_transient`]
//! classifies what the recovery layers may retry.

use std::time::Duration;
use thiserror::Error;

/// # A vendor capability call was rejected.
///
/// Carries the operation name and the vendor's result code so diagnostics
/// can be correlated with vendor logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{op} failed (code {code}): {message}")]
pub struct CapabilityError {
    /// Capability operation, e.g. `"init"` or `"join"`.
    pub op: &'static str,
    /// Vendor result code (`0` when not applicable).
    pub code: i32,
    /// Human-readable detail.
    pub message: String,
}

impl CapabilityError {
    /// Creates a new error for `op`.
    pub fn new(op: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            op,
            code,
            message: message.into(),
        }
    }
}

/// # Errors produced by the session orchestrator.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// An entry point that needs an authenticated capability was called too early.
    #[error("session capability not initialized")]
    NotInitialized,

    /// The vendor capability rejected a call.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Initialization fell back to simulation mode while the real target was wanted.
    #[error("degraded to simulation mode: {reason}")]
    Degraded {
        /// Why the real target could not be reached.
        reason: String,
    },

    /// The runtime is shutting down; no new session work is started.
    #[error("runtime is shutting down")]
    ShutDown,
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sessionvisor::SessionError;
    ///
    /// assert_eq!(SessionError::NotInitialized.as_label(), "session_not_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::NotInitialized => "session_not_initialized",
            SessionError::Capability(_) => "session_capability",
            SessionError::Degraded { .. } => "session_degraded",
            SessionError::ShutDown => "session_shut_down",
        }
    }

    /// Indicates whether the recovery layers may retry after this error.
    ///
    /// Everything except [`SessionError::ShutDown`] is transient.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SessionError::ShutDown)
    }
}

/// # Errors produced by the runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some background tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; {pending} background task(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of tasks that had not finished.
        pending: usize,
    },

    /// OS signal listeners could not be registered.
    #[error("failed to register shutdown signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sessionvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), pending: 1 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}
