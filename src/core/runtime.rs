//! # KioskRuntime: wires the session layer, the watchdog and the bridge together.
//!
//! The [`KioskRuntime`] owns the root [`TaskScope`], the [`SessionOrchestrator`],
//! the [`RecoveryWatchdog`], the optional [`EventBridge`] and the fallback
//! participant poller. It translates session events into watchdog transitions
//! and performs the ordered shutdown.
//!
//! ## Wiring
//! ```text
//! Vendor queue ──► EventBridge ──► SessionOrchestrator (SessionCallbacks)
//!                                        │ emit(Event)
//!                                        ▼
//!                                   ObserverBus ──► SubscriberSet (async subscribers)
//!     initialized             ──► spawn start_session()
//!     meetingJoined           ──► watchdog.on_connected() (unless degraded) + poller.start()
//!     sharingStarted          ──► watchdog.on_sharing_restored()
//!     disconnected(reason)    ──► poller.cancel() + watchdog.on_disconnected()
//!     error(message)          ──► log
//!
//! RecoveryWatchdog ── retry timer ──► reconnect:
//!     leave_session() (errors ignored) → sleep(reload_settle) → initialize(force_reload)
//!       └─ fallback to simulation ⇒ Err(Degraded) (counts as a failed attempt)
//! ```
//!
//! ## Shutdown order
//! ```text
//! poller.cancel → bridge.stop → watchdog.stop → leave_session
//!   → scope.shutdown(grace) → subscribers drained
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use sessionvisor::{Config, KioskRuntime};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), sessionvisor::RuntimeError> {
//!     let runtime = KioskRuntime::builder(Config::default()).build();
//!     runtime.run().await
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::bridge::EventBridge;
use crate::config::Config;
use crate::core::poller::ParticipantPoller;
use crate::core::{shutdown, KioskRuntimeBuilder, TaskScope};
use crate::error::{RuntimeError, SessionError};
use crate::events::EventKind;
use crate::recovery::{ReconnectFn, ReconnectRef, RecoveryWatchdog};
use crate::session::{InitOutcome, SessionOrchestrator};
use crate::subscribers::SubscriberSet;

/// The assembled kiosk runtime. Built with [`KioskRuntime::builder`].
pub struct KioskRuntime {
    pub(crate) cfg: Config,
    pub(crate) scope: TaskScope,
    pub(crate) orchestrator: Arc<SessionOrchestrator>,
    pub(crate) watchdog: Arc<RecoveryWatchdog>,
    pub(crate) bridge: Option<EventBridge>,
    pub(crate) poller: Arc<ParticipantPoller>,
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) stopping: AtomicBool,
}

impl KioskRuntime {
    /// Returns a builder for `cfg`.
    pub fn builder(cfg: Config) -> KioskRuntimeBuilder {
        KioskRuntimeBuilder::new(cfg)
    }

    pub fn orchestrator(&self) -> &Arc<SessionOrchestrator> {
        &self.orchestrator
    }

    pub fn watchdog(&self) -> &Arc<RecoveryWatchdog> {
        &self.watchdog
    }

    /// The sanitized configuration the runtime was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Starts monitoring, the event pump and the first initialization.
    pub async fn start(&self) -> Result<InitOutcome, SessionError> {
        self.watchdog.start();
        if let Some(bridge) = &self.bridge {
            bridge.start();
        }
        self.orchestrator.initialize(false).await
    }

    /// Runs until an OS termination signal, then shuts down.
    ///
    /// A failed first initialization is logged; the runtime keeps running
    /// so that the watchdog can take over.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        match self.start().await {
            Ok(outcome) => tracing::info!(?outcome, "runtime started"),
            Err(e) => {
                tracing::error!(error = %e, label = e.as_label(), "initial session setup failed")
            }
        }

        let signal = match shutdown::wait_for_shutdown_signal().await {
            Ok(signal) => signal,
            Err(e) => {
                if let Err(err) = self.shutdown().await {
                    tracing::warn!(error = %err, "shutdown after signal failure");
                }
                return Err(e.into());
            }
        };
        tracing::info!(%signal, "termination signal received, shutting down");
        self.shutdown().await
    }

    /// Tears everything down in order. Idempotent.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] when background tasks are still
    /// running after `grace`; subscribers are drained either way.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.poller.cancel();
        if let Some(bridge) = &self.bridge {
            bridge.stop().await;
        }
        self.watchdog.stop();
        // A join still in flight must be left too.
        if let Err(e) = self.orchestrator.leave_session() {
            tracing::warn!(error = %e, "leave during shutdown failed");
        }

        let res = self.scope.shutdown(self.cfg.grace).await;
        match &res {
            Ok(()) => tracing::info!("all background tasks stopped"),
            Err(e) => {
                tracing::warn!(error = %e, label = e.as_label(), "shutdown grace exceeded")
            }
        }
        self.subs.shutdown().await;
        res
    }
}

/// Reconnect handle driving the orchestrator on behalf of the watchdog.
pub(crate) fn reconnect_handle(
    orchestrator: Weak<SessionOrchestrator>,
    settle: Duration,
) -> ReconnectRef {
    ReconnectFn::arc(move || {
        let orchestrator = orchestrator.clone();
        async move {
            let Some(orch) = orchestrator.upgrade() else {
                return Err(SessionError::ShutDown);
            };
            if orch.is_in_session() {
                if let Err(e) = orch.leave_session() {
                    tracing::debug!(error = %e, "leave before reconnect failed, continuing");
                }
            }
            tokio::time::sleep(settle).await;

            match orch.initialize(true).await? {
                InitOutcome::Simulated {
                    reason,
                    fallback: true,
                } => Err(SessionError::Degraded {
                    reason: reason.to_string(),
                }),
                _ => Ok(()),
            }
        }
    })
}

/// Registers the runtime's handlers on the orchestrator's observer bus.
pub(crate) fn wire(
    orchestrator: &Arc<SessionOrchestrator>,
    watchdog: &Arc<RecoveryWatchdog>,
    poller: &Arc<ParticipantPoller>,
    scope: &TaskScope,
) {
    let bus = orchestrator.observers();

    let weak = Arc::downgrade(orchestrator);
    let spawner = scope.clone();
    bus.on(EventKind::Initialized, move |_| {
        let weak = weak.clone();
        spawner.spawn(async move {
            let Some(orch) = weak.upgrade() else {
                return;
            };
            if let Err(e) = orch.start_session() {
                tracing::warn!(error = %e, label = e.as_label(), "could not start session");
            }
        });
    });

    let weak = Arc::downgrade(orchestrator);
    let (wd, pl) = (watchdog.clone(), poller.clone());
    bus.on(EventKind::MeetingJoined, move |_| {
        let degraded = weak.upgrade().is_some_and(|o| o.is_degraded());
        if degraded {
            tracing::debug!("joined a fallback simulated session, recovery continues");
        } else {
            wd.on_connected();
        }
        pl.start();
    });

    let wd = watchdog.clone();
    bus.on(EventKind::SharingStarted, move |_| wd.on_sharing_restored());

    let (wd, pl) = (watchdog.clone(), poller.clone());
    bus.on(EventKind::Disconnected, move |ev| {
        tracing::info!(reason = ev.reason.as_deref().unwrap_or(""), "session lost");
        pl.cancel();
        wd.on_disconnected();
    });

    bus.on(EventKind::Error, |ev| {
        let reason = ev.reason.as_deref().unwrap_or("");
        tracing::warn!(reason, "session error reported");
    });
}
