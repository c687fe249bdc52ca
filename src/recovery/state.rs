//! # Watchdog states.

use std::fmt;

/// Connection-recovery state of the [`RecoveryWatchdog`](crate::RecoveryWatchdog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryState {
    /// Not watching; disconnects are ignored.
    #[default]
    Idle,
    /// Connected (or waiting for the first connection); no retry pending.
    Monitoring,
    /// A recovery episode is in flight; a retry timer may be armed.
    Recovering,
    /// Retries exhausted. Requires `reset`, `start` or `on_connected` to leave;
    /// a fresh disconnect also starts a new episode.
    Failed,
}

impl RecoveryState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RecoveryState::Idle => "idle",
            RecoveryState::Monitoring => "monitoring",
            RecoveryState::Recovering => "recovering",
            RecoveryState::Failed => "failed",
        }
    }
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
