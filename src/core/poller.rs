//! Fallback participant poller.
//!
//! Join callbacks can be missed; while in session and not yet sharing, the
//! poller asks the orchestrator to reconcile participants every `interval`.
//! It stops once sharing starts or the session is gone, and is cancelled on
//! disconnect and first thing during shutdown.

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::core::TaskScope;
use crate::session::SessionOrchestrator;

pub(crate) struct ParticipantPoller {
    orchestrator: Weak<SessionOrchestrator>,
    interval: Duration,
    scope: TaskScope,
    active: Mutex<Option<(TaskScope, JoinHandle<()>)>>,
}

impl ParticipantPoller {
    pub(crate) fn new(
        orchestrator: Weak<SessionOrchestrator>,
        interval: Duration,
        scope: TaskScope,
    ) -> Self {
        Self {
            orchestrator,
            interval: interval.max(Duration::from_millis(1)),
            scope,
            active: Mutex::new(None),
        }
    }

    /// (Re)starts polling; a running poll loop is cancelled first.
    pub(crate) fn start(&self) {
        if self.is_active() {
            tracing::debug!("restarting participant poller");
        }
        let scope = self.scope.child();
        let orchestrator = self.orchestrator.clone();
        let interval = self.interval;
        let handle = scope.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(orch) = orchestrator.upgrade() else {
                    return;
                };
                if !orch.is_in_session() || orch.is_sharing() {
                    tracing::debug!("participant poller done");
                    return;
                }
                orch.reconcile_participants();
            }
        });
        if let Some((prev, _)) = self.active.lock().replace((scope, handle)) {
            prev.cancel();
        }
        tracing::debug!(interval_ms = interval.as_millis() as u64, "participant poller started");
    }

    pub(crate) fn cancel(&self) {
        if let Some((scope, _)) = self.active.lock().take() {
            scope.cancel();
            tracing::debug!("participant poller cancelled");
        }
    }

    /// `true` while a poll loop is running; `false` once it was cancelled or
    /// returned on its own.
    pub(crate) fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|(scope, handle)| !scope.is_cancelled() && !handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountConfig, SessionConfig};
    use crate::events::ObserverBus;
    use crate::session::testing::FakeCapability;
    use crate::session::{
        AuthResult, ParticipantId, SessionCallbacks, SessionCapability, SessionStatus,
        SharingStatus,
    };
    use std::sync::Arc;

    async fn in_session(cap: &Arc<FakeCapability>) -> Arc<SessionOrchestrator> {
        let account = AccountConfig {
            sdk_key: "key".into(),
            sdk_secret: "secret".into(),
            meeting_number: "42".into(),
            ..AccountConfig::default()
        };
        let orch = SessionOrchestrator::new(
            SessionConfig::default(),
            account,
            Some(cap.clone() as Arc<dyn SessionCapability>),
            ObserverBus::new(),
            TaskScope::new(),
        );
        orch.initialize(false).await.unwrap();
        orch.on_auth_result(AuthResult::Success);
        orch.on_session_status(SessionStatus::InSession, 0);
        orch
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_someone_shows_up() {
        let cap = FakeCapability::new();
        cap.set_self(1);
        cap.set_participants(&[1]);
        let orch = in_session(&cap).await;

        let poller =
            ParticipantPoller::new(Arc::downgrade(&orch), Duration::from_secs(2), TaskScope::new());
        poller.start();

        tokio::time::sleep(Duration::from_millis(4100)).await;
        assert_eq!(cap.count("start_share"), 0);
        assert_eq!(cap.count("participants"), 3);

        cap.set_participants(&[1, 8]);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cap.count("start_share"), 1);

        orch.on_sharing_status(SharingStatus::SelfSendBegin, ParticipantId(1));
        let polls = cap.count("participants");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(cap.count("participants"), polls);
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_polling() {
        let cap = FakeCapability::new();
        let orch = in_session(&cap).await;
        let poller =
            ParticipantPoller::new(Arc::downgrade(&orch), Duration::from_secs(2), TaskScope::new());

        poller.start();
        assert!(poller.is_active());
        poller.cancel();
        poller.cancel();
        assert!(!poller.is_active());

        let polls = cap.count("participants");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(cap.count("participants"), polls);
    }
}
