use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::bridge::{EventBridge, NativeEventSource};
use crate::config::Config;
use crate::events::ObserverBus;
use crate::recovery::RecoveryWatchdog;
use crate::session::{SessionCapability, SessionOrchestrator};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::poller::ParticipantPoller;
use super::runtime::{reconnect_handle, wire, KioskRuntime};
use super::TaskScope;

/// Builder for constructing a [`KioskRuntime`] with optional features.
pub struct KioskRuntimeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    capability: Option<Arc<dyn SessionCapability>>,
    events: Option<Arc<dyn NativeEventSource>>,
}

impl KioskRuntimeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            capability: None,
            events: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every session event through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Attaches the vendor capability and its native event queue.
    ///
    /// Without a capability the runtime runs in simulation mode and no event
    /// bridge is started.
    pub fn with_capability(
        mut self,
        capability: Arc<dyn SessionCapability>,
        events: Arc<dyn NativeEventSource>,
    ) -> Self {
        self.capability = Some(capability);
        self.events = Some(events);
        self
    }

    /// Builds and returns the runtime.
    ///
    /// This consumes the builder and initializes all components:
    /// - Sanitized configuration
    /// - Subscriber workers and the observer bus
    /// - Orchestrator, watchdog, bridge and poller, each on a child scope
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<KioskRuntime> {
        let mut cfg = self.cfg;
        cfg.sanitize();

        let scope = TaskScope::new();
        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        let observers = ObserverBus::with_subscribers(subs.clone());

        let orchestrator = SessionOrchestrator::new(
            cfg.session.clone(),
            cfg.account.clone(),
            self.capability,
            observers,
            scope.child(),
        );
        let watchdog = RecoveryWatchdog::new(
            cfg.recovery,
            reconnect_handle(Arc::downgrade(&orchestrator), cfg.session.reload_settle),
            scope.child(),
        );
        let bridge = self.events.map(|events| {
            EventBridge::new(
                events,
                orchestrator.clone(),
                cfg.pump_interval_clamped(),
                scope.child(),
            )
        });
        let poller = Arc::new(ParticipantPoller::new(
            Arc::downgrade(&orchestrator),
            cfg.participant_poll_interval,
            scope.child(),
        ));

        wire(&orchestrator, &watchdog, &poller, &scope);

        Arc::new(KioskRuntime {
            cfg,
            scope,
            orchestrator,
            watchdog,
            bridge,
            poller,
            subs,
            stopping: AtomicBool::new(false),
        })
    }
}
