//! # RecoveryWatchdog: backoff-driven reconnection.
//!
//! Owns the connection-recovery state machine and at most one armed retry
//! timer. Transitions are driven only by the public event methods and by the
//! outcome of reconnect attempts.
//!
//! ## Retry flow
//! ```text
//! on_disconnected()
//!   └─► schedule_retry()
//!         ├─ retry_count >= max_retries ─► Failed (cancel timer)
//!         └─ delay = backoff.next(retry_count) ─► arm timer
//!                                                   │ fires
//!                                                   ▼
//!                                   retry_count += 1; reconnect().await
//!                                     ├─ Ok  ─► wait for on_connected / on_sharing_restored
//!                                     └─ Err ─► retry_count < max ? schedule_retry() : Failed
//! ```
//!
//! ## Rules
//! - **One timer**: arming a timer always cancels the previous one first.
//! - **Episodes**: every transition that invalidates in-flight work bumps an
//!   episode counter; a fired timer or a finishing attempt from an older
//!   episode is ignored.
//! - A fired timer's attempt runs to completion; only the waiting phase is
//!   cancelled by later events.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::RecoveryConfig;
use crate::core::{TaskScope, TimerHandle};
use crate::policies::BackoffPolicy;
use crate::recovery::{ReconnectRef, RecoveryState};

/// Mutable part of the watchdog.
#[derive(Default)]
struct WatchdogContext {
    state: RecoveryState,
    retry_count: u32,
    active_timer: Option<TimerHandle>,
    /// Bumped whenever in-flight timers/attempts become stale.
    episode: u64,
}

impl WatchdogContext {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.active_timer.take() {
            timer.cancel();
        }
    }

    fn invalidate(&mut self) {
        self.cancel_timer();
        self.episode = self.episode.wrapping_add(1);
    }
}

/// Connection watchdog with exponential-backoff reconnection.
pub struct RecoveryWatchdog {
    cfg: RecoveryConfig,
    backoff: BackoffPolicy,
    reconnect: ReconnectRef,
    scope: TaskScope,
    ctx: Mutex<WatchdogContext>,
    me: Weak<Self>,
}

impl RecoveryWatchdog {
    /// Creates an `Idle` watchdog.
    ///
    /// Retry timers and attempts are spawned on `scope`; cancelling the scope
    /// aborts them.
    pub fn new(cfg: RecoveryConfig, reconnect: ReconnectRef, scope: TaskScope) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            backoff: BackoffPolicy::from(&cfg),
            cfg,
            reconnect,
            scope,
            ctx: Mutex::new(WatchdogContext::default()),
            me: me.clone(),
        })
    }

    /// Starts monitoring. No-op (besides logging) when already monitoring.
    pub fn start(&self) {
        let mut ctx = self.ctx.lock();
        if ctx.state == RecoveryState::Monitoring {
            tracing::debug!("watchdog already monitoring");
            return;
        }
        ctx.invalidate();
        ctx.state = RecoveryState::Monitoring;
        ctx.retry_count = 0;
        tracing::info!("watchdog started monitoring");
    }

    /// Stops the watchdog and cancels any pending retry.
    pub fn stop(&self) {
        let mut ctx = self.ctx.lock();
        ctx.invalidate();
        ctx.state = RecoveryState::Idle;
        tracing::info!("watchdog stopped");
    }

    /// Reports a lost connection.
    ///
    /// - `Idle`: ignored.
    /// - `Monitoring`: starts a recovery episode.
    /// - `Recovering`: the in-flight retry is stale; cancel it, reset the
    ///   retry count and schedule afresh.
    /// - `Failed`: reset the retry count and resume recovering.
    pub fn on_disconnected(&self) {
        let mut ctx = self.ctx.lock();
        match ctx.state {
            RecoveryState::Idle => {
                tracing::debug!("watchdog idle, disconnect ignored");
                return;
            }
            RecoveryState::Recovering => {
                tracing::info!(
                    retry_count = ctx.retry_count,
                    "new disconnect during recovery, restarting episode"
                );
                ctx.retry_count = 0;
            }
            RecoveryState::Failed => {
                tracing::info!("disconnect while failed, starting new recovery episode");
                ctx.retry_count = 0;
            }
            RecoveryState::Monitoring => {
                tracing::info!("disconnection detected, starting recovery");
            }
        }
        ctx.invalidate();
        ctx.state = RecoveryState::Recovering;
        self.schedule_retry(&mut ctx);
    }

    /// Reports a completed recovery (session joined again).
    pub fn on_connected(&self) {
        let mut ctx = self.ctx.lock();
        ctx.invalidate();
        ctx.state = RecoveryState::Monitoring;
        ctx.retry_count = 0;
        tracing::info!("connection restored");
    }

    /// Reports that sharing resumed; a softer success signal than a full reconnect.
    ///
    /// Only meaningful while `Recovering` or `Monitoring`.
    pub fn on_sharing_restored(&self) {
        let mut ctx = self.ctx.lock();
        match ctx.state {
            RecoveryState::Recovering | RecoveryState::Monitoring => {
                ctx.invalidate();
                ctx.state = RecoveryState::Monitoring;
                ctx.retry_count = 0;
                tracing::info!("sharing restored, recovery complete");
            }
            RecoveryState::Idle | RecoveryState::Failed => {
                tracing::debug!(state = %ctx.state, "sharing restored ignored");
            }
        }
    }

    /// Manual recovery: back to `Monitoring` with a fresh retry budget.
    pub fn reset(&self) {
        let mut ctx = self.ctx.lock();
        ctx.invalidate();
        ctx.retry_count = 0;
        ctx.state = RecoveryState::Monitoring;
        tracing::info!("watchdog reset, ready for a new recovery cycle");
    }

    /// Current state.
    pub fn state(&self) -> RecoveryState {
        self.ctx.lock().state
    }

    /// Reconnect attempts made in the current episode.
    pub fn retry_count(&self) -> u32 {
        self.ctx.lock().retry_count
    }

    /// `true` when retries are exhausted and a human (or `reset`) is needed.
    pub fn needs_attention(&self) -> bool {
        self.ctx.lock().state == RecoveryState::Failed
    }

    /// `true` while a retry timer is armed and has not fired.
    pub fn has_pending_retry(&self) -> bool {
        self.ctx
            .lock()
            .active_timer
            .as_ref()
            .is_some_and(TimerHandle::is_pending)
    }

    /// Arms the retry timer, or enters `Failed` when the budget is spent.
    fn schedule_retry(&self, ctx: &mut WatchdogContext) {
        ctx.cancel_timer();

        if ctx.retry_count >= self.cfg.max_retries {
            ctx.state = RecoveryState::Failed;
            tracing::error!(
                max_retries = self.cfg.max_retries,
                "max retries reached, entering failed state"
            );
            return;
        }

        let delay = self.backoff.next(ctx.retry_count);
        tracing::info!(
            attempt = ctx.retry_count + 1,
            max_retries = self.cfg.max_retries,
            delay_ms = delay.as_millis() as u64,
            "scheduling reconnect"
        );

        let episode = ctx.episode;
        let me = self.me.clone();
        ctx.active_timer = Some(self.scope.spawn_after(delay, async move {
            if let Some(me) = me.upgrade() {
                me.attempt_recovery(episode).await;
            }
        }));
    }

    async fn attempt_recovery(&self, episode: u64) {
        let attempt = {
            let mut ctx = self.ctx.lock();
            if ctx.episode != episode || ctx.state != RecoveryState::Recovering {
                return;
            }
            ctx.active_timer = None;
            ctx.retry_count += 1;
            ctx.retry_count
        };
        tracing::info!(attempt, "attempting recovery");

        let res = self.reconnect.reconnect().await;

        let mut ctx = self.ctx.lock();
        match res {
            Ok(()) => {
                tracing::debug!(attempt, "reconnect issued, awaiting session confirmation");
            }
            Err(e) => {
                let label = e.as_label();
                tracing::warn!(attempt, error = %e, label, "recovery attempt failed");
                if ctx.episode != episode || ctx.state != RecoveryState::Recovering {
                    return;
                }
                if !e.is_transient() {
                    ctx.invalidate();
                    ctx.state = RecoveryState::Idle;
                    tracing::info!(label, "session is gone for good, recovery stopped");
                } else if ctx.retry_count < self.cfg.max_retries {
                    self.schedule_retry(&mut ctx);
                } else {
                    ctx.cancel_timer();
                    ctx.state = RecoveryState::Failed;
                    tracing::error!(attempts = ctx.retry_count, "all recovery attempts exhausted");
                }
            }
        }
    }
}

impl Drop for RecoveryWatchdog {
    fn drop(&mut self) {
        self.ctx.get_mut().cancel_timer();
    }
}
