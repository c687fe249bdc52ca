//! # TaskScope: tracked background tasks and cancellable timers.
//!
//! Every background task of the runtime (retry timers, auth timeouts, settle
//! delays, the event pump, pollers) is spawned through a [`TaskScope`], so
//! shutdown can cancel them all and await their completion.
//!
//! ## Architecture
//! ```text
//! root TaskScope (runtime)
//!   ├── token: CancellationToken ──► child scopes (watchdog, orchestrator, bridge)
//!   └── tracker: TaskTracker     ──► shared by every child scope
//!
//! spawn_after(delay, fut):
//!   select! { timer cancelled → exit, sleep(delay) → fired }
//!   select! { scope cancelled → exit, fut → done }
//! ```
//!
//! ## Rules
//! - Cancelling a [`TimerHandle`] aborts only the **waiting** phase; once a
//!   timer has fired its action runs to completion.
//! - Cancelling the **scope** aborts both phases, and anything spawned after
//!   the scope was cancelled exits without running.
//! - `TimerHandle::cancel` is idempotent and safe on fired handles.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::RuntimeError;

/// Cancellation + tracking domain for background tasks.
#[derive(Clone, Debug)]
pub struct TaskScope {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Default for TaskScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScope {
    /// Creates a new root scope.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Creates a child scope: cancelled together with `self`, tracked by the same tracker.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            tracker: self.tracker.clone(),
        }
    }

    /// Returns the scope's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once the scope (or an ancestor) has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Spawns `fut`, dropping it as soon as the scope is cancelled.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = fut => {}
            }
        })
    }

    /// Arms a one-shot timer that runs `fut` after `delay`.
    pub fn spawn_after<F>(&self, delay: Duration, fut: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = TimerHandle {
            token: self.token.child_token(),
            fired: Arc::new(AtomicBool::new(false)),
        };
        let timer = handle.token.clone();
        let fired = handle.fired.clone();
        let scope = self.token.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = timer.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            fired.store(true, Ordering::SeqCst);
            tokio::select! {
                biased;
                _ = scope.cancelled() => {}
                _ = fut => {}
            }
        });
        handle
    }

    /// Cancels every task of the scope.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the scope and waits up to `grace` for all tracked tasks.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] with the number of tasks still
    /// running when the grace period elapses. A zero `grace` does not wait.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.token.cancel();
        self.tracker.close();
        if grace.is_zero() {
            return Ok(());
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(RuntimeError::GraceExceeded {
                grace,
                pending: self.tracker.len(),
            }),
        }
    }
}

/// Handle to a timer armed by [`TaskScope::spawn_after`].
#[derive(Clone, Debug)]
pub struct TimerHandle {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Cancels the timer if it has not fired yet. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` while the timer is still waiting.
    pub fn is_pending(&self) -> bool {
        !self.fired.load(Ordering::SeqCst) && !self.token.is_cancelled()
    }

    /// Returns `true` once the timer's delay has elapsed.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}
