//! # SessionOrchestrator: authenticate, join and share against the vendor capability.
//!
//! Owns the session lifecycle and the secondary auth-retry loop. Every
//! transition is driven either by a public entry point
//! ([`initialize`](SessionOrchestrator::initialize),
//! [`start_session`](SessionOrchestrator::start_session),
//! [`leave_session`](SessionOrchestrator::leave_session),
//! [`start_share`](SessionOrchestrator::start_share)) or by a native callback
//! ([`SessionCallbacks`]).
//!
//! ## Lifecycle
//! ```text
//! Uninitialized ──initialize──► Authenticating ──auth ok──► Authenticated
//!       │                            │                         │ start_session
//!       │ no capability /            │ timeout / auth failed    ▼
//!       │ init failure               ▼                      InSession ──self share──► Sharing
//!       ▼                      retry in auth_retry_delay        ▲  │
//!  simulation mode             (≤ max_auth_retries)             │  └─ ended/failed/disconnecting
//!  (synthetic events)                                           │        → disconnected(reason)
//!                                                               └── leave_session
//! ```
//!
//! ## Rules
//! - `sharing ⇒ in_session ⇒ authenticated ⇒ initialized`.
//! - The state lock is never held while emitting, calling the capability or awaiting.
//! - Each `initialize` starts a new generation; timers and settle waits of an
//!   older generation are ignored.
//! - Local state is reconciled to "not in session" on any disconnect or
//!   explicit leave, whatever the vendor answered.

use std::sync::{Arc, Weak};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::config::{AccountConfig, SessionConfig};
use crate::core::{TaskScope, TimerHandle};
use crate::error::{CapabilityError, SessionError};
use crate::events::{Event, EventKind, ObserverBus};
use crate::session::participants::{self, participant_ids, Classification};
use crate::session::{
    AuthResult, CallbackKind, Credentials, InitParams, JoinParams, ParticipantId,
    SessionCallbacks, SessionCapability, SessionStatus, SharingStatus,
};

/// Coarse session phase, derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Authenticating,
    Authenticated,
    InSession,
    Sharing,
}

impl SessionPhase {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::InSession => "in_session",
            SessionPhase::Sharing => "sharing",
        }
    }
}

/// What [`SessionOrchestrator::initialize`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Authentication was requested; the result arrives as a callback.
    Authenticating,
    /// Running in simulation mode.
    ///
    /// `fallback` is `true` when the capability exists but initialization
    /// failed, i.e. the real target is still wanted.
    Simulated { reason: Arc<str>, fallback: bool },
    /// A newer `initialize` started while this one was settling.
    Superseded,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub initialized: bool,
    pub authenticated: bool,
    pub in_session: bool,
    pub sharing: bool,
    pub auth_retry_count: u32,
    /// Why the orchestrator runs in simulation mode, if it does.
    pub simulation: Option<Arc<str>>,
    pub status: String,
}

struct Simulation {
    reason: Arc<str>,
    fallback: bool,
}

#[derive(Default)]
struct SessionState {
    initialized: bool,
    authenticating: bool,
    authenticated: bool,
    in_session: bool,
    sharing: bool,
    /// Vendor handles exist and need `cleanup` before a re-init.
    handles_live: bool,
    /// A `disconnected` was already emitted for the current session.
    disconnect_reported: bool,
    auth_retry_count: u32,
    auth_timeout: Option<TimerHandle>,
    pending_reinit: Option<TimerHandle>,
    simulated_join: Option<TimerHandle>,
    simulation: Option<Simulation>,
    status: String,
    generation: u64,
}

impl SessionState {
    fn cancel_auth_timeout(&mut self) {
        if let Some(timer) = self.auth_timeout.take() {
            timer.cancel();
        }
    }

    fn cancel_pending_reinit(&mut self) {
        if let Some(timer) = self.pending_reinit.take() {
            timer.cancel();
        }
    }

    fn cancel_simulated_join(&mut self) {
        if let Some(timer) = self.simulated_join.take() {
            timer.cancel();
        }
    }

    /// Clears `in_session`/`sharing`; returns whether we were in session.
    fn clear_session(&mut self) -> bool {
        let was = self.in_session;
        self.in_session = false;
        self.sharing = false;
        was
    }

    fn reset_flags(&mut self) {
        self.clear_session();
        self.initialized = false;
        self.authenticating = false;
        self.authenticated = false;
        self.disconnect_reported = false;
    }

    fn phase(&self) -> SessionPhase {
        if self.sharing {
            SessionPhase::Sharing
        } else if self.in_session {
            SessionPhase::InSession
        } else if self.authenticated {
            SessionPhase::Authenticated
        } else if self.authenticating {
            SessionPhase::Authenticating
        } else {
            SessionPhase::Uninitialized
        }
    }
}

enum AuthRetry {
    Scheduled { attempt: u32 },
    Exhausted { attempts: u32 },
}

/// Session lifecycle owner.
pub struct SessionOrchestrator {
    cfg: SessionConfig,
    account: AccountConfig,
    capability: Option<Arc<dyn SessionCapability>>,
    state: Mutex<SessionState>,
    observers: ObserverBus,
    scope: TaskScope,
    me: Weak<Self>,
}

impl SessionOrchestrator {
    /// Creates an uninitialized orchestrator.
    ///
    /// Without a `capability` every `initialize` enters simulation mode.
    pub fn new(
        cfg: SessionConfig,
        account: AccountConfig,
        capability: Option<Arc<dyn SessionCapability>>,
        observers: ObserverBus,
        scope: TaskScope,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            cfg,
            account,
            capability,
            state: Mutex::new(SessionState {
                status: "Not initialized".to_string(),
                ..SessionState::default()
            }),
            observers,
            scope,
            me: me.clone(),
        })
    }

    /// The bus every lifecycle event is emitted on.
    pub fn observers(&self) -> &ObserverBus {
        &self.observers
    }

    /// Initializes the capability and requests authentication.
    ///
    /// With `force_reload`, live vendor handles are torn down first and the
    /// orchestrator waits `reload_settle` before re-initializing. Falls back
    /// to simulation mode when there is no capability or a vendor call fails.
    pub async fn initialize(&self, force_reload: bool) -> Result<InitOutcome, SessionError> {
        if self.scope.is_cancelled() {
            return Err(SessionError::ShutDown);
        }
        let Some(cap) = self.capability.clone() else {
            return Ok(self.enter_simulation("session capability unavailable".into(), false));
        };

        let (generation, teardown) = {
            let mut st = self.state.lock();
            st.generation = st.generation.wrapping_add(1);
            st.cancel_auth_timeout();
            st.cancel_pending_reinit();
            st.cancel_simulated_join();

            let was_simulated = st.simulation.take().is_some();
            let teardown = force_reload && st.handles_live;
            if teardown || was_simulated {
                st.reset_flags();
            }
            if teardown {
                st.handles_live = false;
                st.status = "Reloading...".to_string();
            }
            (st.generation, teardown)
        };

        if teardown {
            tracing::info!("tearing down vendor handles before re-initializing");
            if let Err(e) = cap.cleanup() {
                tracing::warn!(error = %e, "vendor cleanup failed");
            }
            tokio::time::sleep(self.cfg.reload_settle).await;
            if self.superseded(generation) {
                return Ok(InitOutcome::Superseded);
            }
        }

        match self.start_vendor(&cap, generation).await {
            Ok(true) => Ok(InitOutcome::Authenticating),
            Ok(false) => Ok(InitOutcome::Superseded),
            Err(e) => {
                tracing::warn!(error = %e, "initialization failed, using simulation mode");
                Ok(self.enter_simulation(e.to_string().into(), true))
            }
        }
    }

    /// Joins the configured session.
    ///
    /// In simulation mode the in-session transition is fabricated after
    /// `simulated_join_delay`.
    pub fn start_session(&self) -> Result<(), SessionError> {
        let cap = {
            let mut st = self.state.lock();
            if !st.initialized || !st.authenticated {
                return Err(SessionError::NotInitialized);
            }
            if st.simulation.is_some() {
                st.status = "Joining (simulation)".to_string();
                st.cancel_simulated_join();
                let me = self.me.clone();
                let generation = st.generation;
                let delay = self.cfg.simulated_join_delay;
                st.simulated_join = Some(self.scope.spawn_after(delay, async move {
                    if let Some(me) = me.upgrade() {
                        me.enter_simulated_session(generation);
                    }
                }));
                return Ok(());
            }
            st.status = "Joining...".to_string();
            self.capability.clone()
        };
        let Some(cap) = cap else {
            return Err(SessionError::NotInitialized);
        };

        let joined = JoinParams::from_account(&self.account).and_then(|params| {
            if let Err(e) = cap.configure_unattended(&self.cfg.unattended) {
                tracing::debug!(error = %e, "could not apply unattended configuration before join");
            }
            cap.join(&params)
        });
        match joined {
            Ok(()) => {
                tracing::info!("join requested");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "join rejected");
                self.state.lock().status = format!("Join failed: {e}");
                self.observers.emit(Event::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Leaves the session. Local state is cleared whatever the vendor answers.
    pub fn leave_session(&self) -> Result<(), SessionError> {
        let call_vendor = {
            let mut st = self.state.lock();
            st.cancel_simulated_join();
            st.clear_session();
            if st.initialized {
                st.status = "Left session".to_string();
            }
            st.simulation.is_none() && st.handles_live
        };
        let Some(cap) = self.capability.as_ref().filter(|_| call_vendor) else {
            return Ok(());
        };
        cap.leave().map_err(|e| {
            tracing::warn!(error = %e, "leave request failed");
            SessionError::from(e)
        })
    }

    /// Starts sharing. No-op unless in session and not yet sharing.
    pub fn start_share(&self) -> Result<(), SessionError> {
        let simulated = {
            let mut st = self.state.lock();
            if !st.in_session || st.sharing {
                tracing::debug!(
                    in_session = st.in_session,
                    sharing = st.sharing,
                    "share request skipped"
                );
                return Ok(());
            }
            if st.simulation.is_some() {
                st.sharing = true;
                st.status = "Sharing (simulation)".to_string();
            }
            st.simulation.is_some()
        };
        if simulated {
            self.observers.emit(Event::new(EventKind::SharingStarted));
            return Ok(());
        }

        let Some(cap) = self.capability.as_ref() else {
            return Err(SessionError::NotInitialized);
        };
        match cap.start_share() {
            Ok(()) => {
                tracing::info!("share requested");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start sharing");
                Err(e.into())
            }
        }
    }

    /// Counts participants other than the local endpoint. Never fails; any
    /// query error yields `0`.
    pub fn other_participant_count(&self) -> usize {
        let Some(cap) = self.capability.as_ref() else {
            return 0;
        };
        {
            let st = self.state.lock();
            if st.simulation.is_some() || !st.handles_live {
                return 0;
            }
        }
        match cap.participants() {
            Ok(raw) => participant_ids(raw)
                .into_iter()
                .filter(|id| participants::classify(cap.as_ref(), *id).counts_as_other())
                .count(),
            Err(e) => {
                tracing::warn!(error = %e, "participant query failed");
                0
            }
        }
    }

    /// Starts sharing when in session, not sharing and someone else is present.
    ///
    /// Returns `true` when a share was triggered.
    pub fn reconcile_participants(&self) -> bool {
        {
            let st = self.state.lock();
            if !st.in_session || st.sharing {
                return false;
            }
        }
        let others = self.other_participant_count();
        if others == 0 {
            return false;
        }
        tracing::info!(others, "participants found by reconciliation, starting share");
        self.observers.emit(Event::new(EventKind::OtherParticipantPresent));
        let _ = self.start_share();
        true
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase()
    }

    /// Human-readable status line.
    pub fn status_text(&self) -> String {
        self.state.lock().status.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.state.lock();
        SessionSnapshot {
            phase: st.phase(),
            initialized: st.initialized,
            authenticated: st.authenticated,
            in_session: st.in_session,
            sharing: st.sharing,
            auth_retry_count: st.auth_retry_count,
            simulation: st.simulation.as_ref().map(|s| s.reason.clone()),
            status: st.status.clone(),
        }
    }

    pub fn is_in_session(&self) -> bool {
        self.state.lock().in_session
    }

    pub fn is_sharing(&self) -> bool {
        self.state.lock().sharing
    }

    pub fn is_simulated(&self) -> bool {
        self.state.lock().simulation.is_some()
    }

    /// `true` when simulating because initialization failed while a capability exists.
    pub fn is_degraded(&self) -> bool {
        self.state
            .lock()
            .simulation
            .as_ref()
            .is_some_and(|s| s.fallback)
    }

    /// Returns `Ok(false)` when a newer `initialize` superseded this one.
    async fn start_vendor(
        &self,
        cap: &Arc<dyn SessionCapability>,
        generation: u64,
    ) -> Result<bool, CapabilityError> {
        cap.init(&InitParams::new(self.cfg.web_domain.clone()))?;
        self.state.lock().handles_live = true;
        tracing::info!("vendor capability initialized");

        tokio::time::sleep(self.cfg.init_settle).await;
        if self.superseded(generation) {
            return Ok(false);
        }

        cap.create_services()?;
        cap.register(CallbackKind::Auth)?;
        let credentials = Credentials::signed(&self.account, SystemTime::now())?;

        {
            let mut st = self.state.lock();
            st.authenticating = true;
            st.status = "Authenticating...".to_string();
            let me = self.me.clone();
            st.auth_timeout = Some(self.scope.spawn_after(self.cfg.auth_timeout, async move {
                if let Some(me) = me.upgrade() {
                    me.on_auth_timeout(generation);
                }
            }));
        }

        if let Err(e) = cap.authenticate(&credentials) {
            let mut st = self.state.lock();
            st.cancel_auth_timeout();
            st.authenticating = false;
            return Err(e);
        }
        tracing::info!(
            expires_at = credentials.expires_at(),
            "authentication requested, awaiting result"
        );
        Ok(true)
    }

    fn superseded(&self, generation: u64) -> bool {
        self.scope.is_cancelled() || self.state.lock().generation != generation
    }

    fn enter_simulation(&self, reason: Arc<str>, fallback: bool) -> InitOutcome {
        {
            let mut st = self.state.lock();
            st.cancel_auth_timeout();
            st.authenticating = false;
            st.initialized = true;
            st.authenticated = true;
            st.simulation = Some(Simulation {
                reason: reason.clone(),
                fallback,
            });
            st.status = "Simulation mode".to_string();
        }
        tracing::warn!(%reason, fallback, "running in simulation mode");
        self.observers.emit(Event::new(EventKind::Initialized));
        InitOutcome::Simulated { reason, fallback }
    }

    fn enter_simulated_session(&self, generation: u64) {
        {
            let mut st = self.state.lock();
            if st.generation != generation || st.simulation.is_none() || !st.authenticated {
                return;
            }
            st.simulated_join = None;
            st.in_session = true;
            st.status = "In session (simulation)".to_string();
        }
        tracing::info!("joined simulated session");
        self.observers.emit(Event::new(EventKind::MeetingJoined));
    }

    fn on_auth_timeout(&self, generation: u64) {
        let retry = {
            let mut st = self.state.lock();
            if st.generation != generation || !st.authenticating || st.authenticated {
                return;
            }
            st.auth_timeout = None;
            st.authenticating = false;
            st.status = "Authentication timed out".to_string();
            self.schedule_reinit_locked(&mut st)
        };
        tracing::warn!(
            timeout_ms = self.cfg.auth_timeout.as_millis() as u64,
            "auth result did not arrive in time"
        );
        self.observers.emit(Event::error("authentication timed out"));
        self.report_auth_retry(retry);
    }

    /// Counts an auth failure and arms a delayed `initialize(true)` while under budget.
    fn schedule_reinit_locked(&self, st: &mut SessionState) -> AuthRetry {
        st.auth_retry_count += 1;
        let attempt = st.auth_retry_count;
        if attempt > self.cfg.max_auth_retries {
            return AuthRetry::Exhausted {
                attempts: self.cfg.max_auth_retries,
            };
        }

        st.cancel_pending_reinit();
        let me = self.me.clone();
        st.pending_reinit = Some(self.scope.spawn_after(self.cfg.auth_retry_delay, async move {
            let Some(me) = me.upgrade() else {
                return;
            };
            if let Err(e) = me.initialize(true).await {
                tracing::warn!(error = %e, "re-initialize after auth trouble failed");
            }
        }));
        AuthRetry::Scheduled { attempt }
    }

    fn report_auth_retry(&self, retry: AuthRetry) {
        match retry {
            AuthRetry::Scheduled { attempt } => {
                tracing::info!(
                    attempt,
                    max = self.cfg.max_auth_retries,
                    delay_ms = self.cfg.auth_retry_delay.as_millis() as u64,
                    "re-initialize scheduled"
                );
            }
            AuthRetry::Exhausted { attempts } => {
                tracing::error!(
                    attempts,
                    "auth retries exhausted, check credentials and vendor setup"
                );
                self.observers.emit(Event::error(format!(
                    "authentication failed after {attempts} retries"
                )));
            }
        }
    }

    fn on_authenticated(&self) {
        if let Some(cap) = self.capability.as_ref() {
            for kind in [CallbackKind::Session, CallbackKind::Participants, CallbackKind::Sharing] {
                if let Err(e) = cap.register(kind) {
                    tracing::warn!(?kind, error = %e, "could not wire callback sink");
                }
            }
            if let Err(e) = cap.configure_unattended(&self.cfg.unattended) {
                tracing::warn!(error = %e, "could not apply unattended configuration");
            }
        }
        tracing::info!("authenticated");
        self.observers.emit(Event::new(EventKind::Initialized));
    }

    fn on_entered_session(&self) {
        let cap = {
            let mut st = self.state.lock();
            if !st.authenticated {
                tracing::warn!("in-session reported before authentication, ignored");
                return;
            }
            st.in_session = true;
            st.disconnect_reported = false;
            st.status = "In session".to_string();
            self.capability.clone()
        };

        if let Some(cap) = cap {
            if let Err(e) = cap.configure_unattended(&self.cfg.unattended) {
                tracing::warn!(error = %e, "could not re-apply unattended configuration");
            }
            hide_ui(cap.as_ref());
            self.schedule_ui_hides();
        }

        tracing::info!("joined session");
        self.observers.emit(Event::new(EventKind::MeetingJoined));

        let others = self.other_participant_count();
        if others > 0 {
            tracing::info!(others, "participants already present, sharing after settle");
            self.observers.emit(Event::new(EventKind::OtherParticipantPresent));
            let me = self.me.clone();
            self.scope.spawn_after(self.cfg.share_settle, async move {
                if let Some(me) = me.upgrade() {
                    let _ = me.start_share();
                }
            });
        }
    }

    fn schedule_ui_hides(&self) {
        if self.cfg.ui_hide_delays.is_empty() {
            return;
        }
        let delays = self.cfg.ui_hide_delays.clone();
        let me = self.me.clone();
        self.scope.spawn(async move {
            for delay in delays {
                tokio::time::sleep(delay).await;
                let Some(me) = me.upgrade() else {
                    return;
                };
                if !me.is_in_session() {
                    return;
                }
                if let Some(cap) = me.capability.as_ref() {
                    hide_ui(cap.as_ref());
                }
            }
        });
    }

    fn classify(&self, id: ParticipantId) -> Classification {
        match self.capability.as_ref() {
            Some(cap) if !self.is_simulated() => participants::classify(cap.as_ref(), id),
            _ => Classification::Unresolved,
        }
    }
}

fn hide_ui(cap: &dyn SessionCapability) {
    if let Err(e) = cap.hide_session_ui() {
        tracing::debug!(error = %e, "hiding vendor ui failed");
    }
}

impl SessionCallbacks for SessionOrchestrator {
    fn on_auth_result(&self, result: AuthResult) {
        let retry = {
            let mut st = self.state.lock();
            st.cancel_auth_timeout();
            if !st.authenticating {
                tracing::debug!(?result, "auth result outside an authentication attempt, ignored");
                return;
            }
            st.authenticating = false;
            match result {
                AuthResult::Success => {
                    st.initialized = true;
                    st.authenticated = true;
                    st.auth_retry_count = 0;
                    st.cancel_pending_reinit();
                    st.status = "Authenticated".to_string();
                    None
                }
                AuthResult::Failed(code) => {
                    st.status = format!("Authentication failed: {code}");
                    Some(self.schedule_reinit_locked(&mut st))
                }
            }
        };

        match (result, retry) {
            (AuthResult::Failed(code), Some(retry)) => {
                tracing::warn!(code, "authentication rejected");
                self.observers
                    .emit(Event::error(format!("authentication failed with code {code}")));
                self.report_auth_retry(retry);
            }
            _ => self.on_authenticated(),
        }
    }

    fn on_identity_expired(&self) {
        tracing::warn!("session identity expired, re-authentication needed");
        self.observers.emit(Event::error("session identity expired"));
    }

    fn on_session_status(&self, status: SessionStatus, code: i32) {
        tracing::info!(?status, code, "session status changed");
        match status {
            SessionStatus::InSession => self.on_entered_session(),
            SessionStatus::Disconnecting => {
                let report = {
                    let mut st = self.state.lock();
                    st.status = "Disconnecting...".to_string();
                    let was = st.clear_session();
                    st.disconnect_reported |= was;
                    was
                };
                if report {
                    self.observers.emit(Event::disconnected("session disconnecting"));
                }
            }
            SessionStatus::Ended | SessionStatus::Failed => {
                let report = {
                    let mut st = self.state.lock();
                    st.clear_session();
                    st.status = "Disconnected".to_string();
                    !std::mem::take(&mut st.disconnect_reported)
                };
                if report {
                    let reason = match status {
                        SessionStatus::Ended => "session ended".to_string(),
                        _ => format!("session failed (code {code})"),
                    };
                    tracing::info!(%reason, "emitting disconnected");
                    self.observers.emit(Event::disconnected(reason));
                }
            }
            SessionStatus::Idle => {
                let report = {
                    let mut st = self.state.lock();
                    st.status = "Idle".to_string();
                    let was = st.clear_session() && !st.disconnect_reported;
                    st.disconnect_reported |= was;
                    was
                };
                if report {
                    self.observers.emit(Event::disconnected("session idle"));
                }
            }
            SessionStatus::Connecting => self.state.lock().status = "Connecting...".to_string(),
            SessionStatus::WaitingForHost => {
                self.state.lock().status = "Waiting for host...".to_string()
            }
            SessionStatus::InWaitingRoom => {
                self.state.lock().status = "In waiting room...".to_string()
            }
            SessionStatus::Reconnecting => {
                self.state.lock().status = "Reconnecting...".to_string()
            }
            SessionStatus::Other(_) => {}
        }
    }

    fn on_participants_joined(&self, ids: &[ParticipantId]) {
        tracing::info!(count = ids.len(), "participants joined");
        if ids.is_empty() || !self.is_in_session() {
            return;
        }
        let others = ids
            .iter()
            .filter(|id| self.classify(**id).counts_as_other())
            .count();
        if others == 0 {
            tracing::debug!("only the local identity joined");
            return;
        }
        self.observers.emit(Event::new(EventKind::OtherParticipantPresent));
        if !self.is_sharing() {
            tracing::info!(others, "participant detected, starting share");
            let _ = self.start_share();
        }
    }

    fn on_participants_left(&self, ids: &[ParticipantId]) {
        tracing::info!(count = ids.len(), "participants left");
    }

    fn on_sharing_status(&self, status: SharingStatus, user: ParticipantId) {
        tracing::info!(?status, %user, "sharing status changed");
        match status {
            SharingStatus::SelfSendBegin => {
                let started = {
                    let mut st = self.state.lock();
                    if st.in_session {
                        st.sharing = true;
                        st.status = "Sharing".to_string();
                    }
                    st.in_session
                };
                if started {
                    self.observers.emit(Event::new(EventKind::SharingStarted));
                } else {
                    tracing::warn!("sharing began outside of a session, ignored");
                }
            }
            SharingStatus::SelfSendEnd | SharingStatus::Inactive => {
                let stopped = {
                    let mut st = self.state.lock();
                    let was = st.sharing && st.in_session;
                    st.sharing = false;
                    if was {
                        st.status = "In session".to_string();
                    }
                    was
                };
                if stopped {
                    self.observers.emit(Event::new(EventKind::SharingStopped));
                }
            }
            SharingStatus::Other(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeCapability;
    use std::time::Duration;
    use tokio::time::sleep;

    type Recorded = Arc<Mutex<Vec<Event>>>;

    const ALL: [EventKind; 7] = [
        EventKind::Initialized,
        EventKind::MeetingJoined,
        EventKind::SharingStarted,
        EventKind::SharingStopped,
        EventKind::OtherParticipantPresent,
        EventKind::Disconnected,
        EventKind::Error,
    ];

    fn account() -> AccountConfig {
        AccountConfig {
            sdk_key: "key".into(),
            sdk_secret: "secret".into(),
            meeting_number: "123456789".into(),
            ..AccountConfig::default()
        }
    }

    fn build(
        cfg: SessionConfig,
        account: AccountConfig,
        cap: Option<Arc<FakeCapability>>,
    ) -> (Arc<SessionOrchestrator>, Recorded) {
        let cap = cap.map(|c| c as Arc<dyn SessionCapability>);
        let orch =
            SessionOrchestrator::new(cfg, account, cap, ObserverBus::new(), TaskScope::new());
        let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
        for kind in ALL {
            let s = seen.clone();
            orch.observers().on(kind, move |ev| s.lock().push(ev.clone()));
        }
        (orch, seen)
    }

    fn orchestrator_with(
        cfg: SessionConfig,
        cap: Option<Arc<FakeCapability>>,
    ) -> (Arc<SessionOrchestrator>, Recorded) {
        build(cfg, account(), cap)
    }

    fn orchestrator(cap: Option<Arc<FakeCapability>>) -> (Arc<SessionOrchestrator>, Recorded) {
        orchestrator_with(SessionConfig::default(), cap)
    }

    fn kinds(seen: &Recorded) -> Vec<EventKind> {
        seen.lock().iter().map(|e| e.kind).collect()
    }

    fn count(seen: &Recorded, kind: EventKind) -> usize {
        seen.lock().iter().filter(|e| e.kind == kind).count()
    }

    async fn joined(cap: &Arc<FakeCapability>) -> (Arc<SessionOrchestrator>, Recorded) {
        let (orch, seen) = orchestrator(Some(cap.clone()));
        assert_eq!(orch.initialize(false).await.unwrap(), InitOutcome::Authenticating);
        orch.on_auth_result(AuthResult::Success);
        orch.start_session().unwrap();
        orch.on_session_status(SessionStatus::InSession, 0);
        (orch, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_runs_end_to_end() {
        let (orch, seen) = orchestrator(None);

        let outcome = orch.initialize(false).await.unwrap();
        assert!(matches!(outcome, InitOutcome::Simulated { fallback: false, .. }));
        assert_eq!(kinds(&seen), vec![EventKind::Initialized]);
        assert!(orch.is_simulated());
        assert!(!orch.is_degraded());

        orch.start_session().unwrap();
        sleep(Duration::from_millis(900)).await;
        assert_eq!(count(&seen, EventKind::MeetingJoined), 0);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(count(&seen, EventKind::MeetingJoined), 1);
        assert_eq!(orch.phase(), SessionPhase::InSession);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count(&seen, EventKind::SharingStarted), 0);

        orch.on_participants_joined(&[ParticipantId(42)]);
        assert_eq!(
            kinds(&seen),
            vec![
                EventKind::Initialized,
                EventKind::MeetingJoined,
                EventKind::OtherParticipantPresent,
                EventKind::SharingStarted,
            ]
        );
        assert_eq!(orch.phase(), SessionPhase::Sharing);
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_wires_callbacks_and_emits_initialized() {
        let cap = FakeCapability::new();
        let (orch, seen) = orchestrator(Some(cap.clone()));

        orch.initialize(false).await.unwrap();
        assert_eq!(orch.phase(), SessionPhase::Authenticating);
        assert_eq!(cap.calls(), vec!["init", "create_services", "register", "authenticate"]);
        assert!(seen.lock().is_empty());

        orch.on_auth_result(AuthResult::Success);
        assert_eq!(kinds(&seen), vec![EventKind::Initialized]);
        assert_eq!(
            cap.registered(),
            vec![
                CallbackKind::Auth,
                CallbackKind::Session,
                CallbackKind::Participants,
                CallbackKind::Sharing,
            ]
        );
        assert_eq!(cap.count("configure_unattended"), 1);
        assert_eq!(orch.phase(), SessionPhase::Authenticated);

        // The auth timeout was cancelled by the callback.
        sleep(Duration::from_secs(30)).await;
        assert_eq!(count(&seen, EventKind::Error), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn leave_clears_state_even_when_vendor_rejects() {
        let cap = FakeCapability::new();
        let (orch, _seen) = joined(&cap).await;
        orch.on_sharing_status(SharingStatus::SelfSendBegin, ParticipantId(1));
        assert!(orch.is_sharing());

        cap.reject("leave");
        assert!(matches!(orch.leave_session(), Err(SessionError::Capability(_))));

        let snap = orch.snapshot();
        assert!(!snap.in_session);
        assert!(!snap.sharing);
        assert!(snap.authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_timeout_retries_then_gives_up() {
        let cap = FakeCapability::new();
        let cfg = SessionConfig {
            max_auth_retries: 2,
            ..SessionConfig::default()
        };
        let (orch, seen) = orchestrator_with(cfg, Some(cap.clone()));

        orch.initialize(false).await.unwrap();
        assert_eq!(cap.count("authenticate"), 1);

        // Timeout at 10s, error emitted, re-init armed for 5s later.
        sleep(Duration::from_millis(10_600)).await;
        assert_eq!(count(&seen, EventKind::Error), 1);
        assert_eq!(cap.count("cleanup"), 0);
        assert_eq!(orch.snapshot().auth_retry_count, 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(cap.count("cleanup"), 1);
        assert_eq!(cap.count("authenticate"), 2);

        sleep(Duration::from_secs(40)).await;
        assert_eq!(cap.count("cleanup"), 2);
        assert_eq!(cap.count("authenticate"), 3);
        // Three timeouts and one terminal diagnostic.
        assert_eq!(count(&seen, EventKind::Error), 4);
        let last = seen.lock().last().and_then(|e| e.reason.clone());
        assert_eq!(last.as_deref(), Some("authentication failed after 2 retries"));

        sleep(Duration::from_secs(120)).await;
        assert_eq!(cap.count("cleanup"), 2);
        assert_eq!(cap.count("authenticate"), 3);
        assert_eq!(count(&seen, EventKind::Error), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_retries_and_success_resets_budget() {
        let cap = FakeCapability::new();
        let (orch, seen) = orchestrator(Some(cap.clone()));
        orch.initialize(false).await.unwrap();

        orch.on_auth_result(AuthResult::Failed(63));
        assert_eq!(count(&seen, EventKind::Error), 1);
        assert_eq!(
            seen.lock()[0].reason.as_deref(),
            Some("authentication failed with code 63")
        );
        assert_eq!(orch.snapshot().auth_retry_count, 1);

        sleep(Duration::from_secs(8)).await;
        assert_eq!(cap.count("authenticate"), 2);
        orch.on_auth_result(AuthResult::Success);
        assert_eq!(orch.snapshot().auth_retry_count, 0);
        assert_eq!(count(&seen, EventKind::Initialized), 1);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(count(&seen, EventKind::Error), 1);
        assert_eq!(cap.count("authenticate"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn init_failure_falls_back_and_next_attempt_targets_vendor() {
        let cap = FakeCapability::new();
        cap.reject("init");
        let (orch, seen) = orchestrator(Some(cap.clone()));

        let outcome = orch.initialize(false).await.unwrap();
        assert!(matches!(outcome, InitOutcome::Simulated { fallback: true, .. }));
        assert!(orch.is_degraded());
        assert_eq!(kinds(&seen), vec![EventKind::Initialized]);

        cap.accept("init");
        assert_eq!(orch.initialize(true).await.unwrap(), InitOutcome::Authenticating);
        let snap = orch.snapshot();
        assert!(snap.simulation.is_none());
        assert_eq!(snap.phase, SessionPhase::Authenticating);
        assert_eq!(cap.count("cleanup"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn present_participants_trigger_share_after_settle() {
        let cap = FakeCapability::new();
        cap.set_self(1);
        cap.know(2, false);
        cap.set_participants(&[1, 2]);
        let (_orch, seen) = joined(&cap).await;

        assert_eq!(
            kinds(&seen),
            vec![
                EventKind::Initialized,
                EventKind::MeetingJoined,
                EventKind::OtherParticipantPresent,
            ]
        );
        assert_eq!(cap.count("hide_session_ui"), 1);
        assert_eq!(cap.count("start_share"), 0);

        sleep(Duration::from_millis(600)).await;
        assert_eq!(cap.count("hide_session_ui"), 2);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(cap.count("start_share"), 1);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(cap.count("hide_session_ui"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn only_non_local_joins_start_sharing() {
        let cap = FakeCapability::new();
        cap.set_self(1);
        let (orch, seen) = joined(&cap).await;

        orch.on_participants_joined(&[ParticipantId(1)]);
        assert_eq!(count(&seen, EventKind::OtherParticipantPresent), 0);
        assert_eq!(cap.count("start_share"), 0);

        // Unknown to the vendor: counts as someone else.
        orch.on_participants_joined(&[ParticipantId(1), ParticipantId(99)]);
        assert_eq!(count(&seen, EventKind::OtherParticipantPresent), 1);
        assert_eq!(cap.count("start_share"), 1);

        orch.on_participants_left(&[ParticipantId(99)]);
        assert!(orch.is_in_session());
    }

    #[tokio::test(start_paused = true)]
    async fn sharing_stopped_only_while_sharing_in_session() {
        let cap = FakeCapability::new();
        let (orch, seen) = joined(&cap).await;

        orch.on_sharing_status(SharingStatus::SelfSendEnd, ParticipantId(1));
        assert_eq!(count(&seen, EventKind::SharingStopped), 0);

        orch.on_sharing_status(SharingStatus::SelfSendBegin, ParticipantId(1));
        orch.on_sharing_status(SharingStatus::Inactive, ParticipantId(0));
        assert_eq!(count(&seen, EventKind::SharingStarted), 1);
        assert_eq!(count(&seen, EventKind::SharingStopped), 1);

        orch.on_sharing_status(SharingStatus::SelfSendBegin, ParticipantId(1));
        orch.on_session_status(SessionStatus::Ended, 0);
        orch.on_sharing_status(SharingStatus::SelfSendEnd, ParticipantId(1));
        assert_eq!(count(&seen, EventKind::SharingStopped), 1);
        assert_eq!(orch.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_reported_once_per_session() {
        let cap = FakeCapability::new();
        let (orch, seen) = joined(&cap).await;

        orch.on_session_status(SessionStatus::Disconnecting, 0);
        orch.on_session_status(SessionStatus::Ended, 0);
        assert_eq!(count(&seen, EventKind::Disconnected), 1);
        assert!(!orch.is_in_session());

        // A failed join never entered the session but is still a disconnect.
        orch.on_session_status(SessionStatus::Failed, 5);
        let reasons: Vec<_> = seen
            .lock()
            .iter()
            .filter(|e| e.kind == EventKind::Disconnected)
            .filter_map(|e| e.reason.clone())
            .collect();
        assert_eq!(reasons.len(), 2);
        assert_eq!(&*reasons[0], "session disconnecting");
        assert_eq!(&*reasons[1], "session failed (code 5)");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_while_in_session_counts_as_a_drop() {
        let cap = FakeCapability::new();
        let (orch, seen) = joined(&cap).await;
        assert!(orch.is_in_session());

        orch.on_session_status(SessionStatus::Idle, 0);
        assert!(!orch.is_in_session());
        assert!(!orch.is_sharing());
        assert_eq!(orch.status_text(), "Idle");
        assert_eq!(count(&seen, EventKind::Disconnected), 1);

        // The trailing end of the same session is not reported again.
        orch.on_session_status(SessionStatus::Ended, 0);
        orch.on_session_status(SessionStatus::Idle, 0);
        assert_eq!(count(&seen, EventKind::Disconnected), 1);

        orch.on_session_status(SessionStatus::InWaitingRoom, 0);
        assert_eq!(orch.status_text(), "In waiting room...");
        assert!(!orch.is_in_session());
        assert_eq!(count(&seen, EventKind::Disconnected), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_session_requires_initialization_and_valid_number() {
        let cap = FakeCapability::new();
        let (orch, _seen) = orchestrator(Some(cap.clone()));
        assert!(matches!(orch.start_session(), Err(SessionError::NotInitialized)));

        let mut bad = account();
        bad.meeting_number = "abc".into();
        let (orch, seen) = build(SessionConfig::default(), bad, Some(cap.clone()));
        orch.initialize(false).await.unwrap();
        orch.on_auth_result(AuthResult::Success);
        assert!(matches!(orch.start_session(), Err(SessionError::Capability(_))));
        assert_eq!(cap.count("join"), 0);
        assert!(orch.status_text().starts_with("Join failed"));
        assert_eq!(kinds(&seen), vec![EventKind::Initialized, EventKind::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn participant_count_never_fails() {
        let cap = FakeCapability::new();
        cap.set_self(1);
        cap.set_participants(&[1, 2, 3]);
        let (orch, _seen) = joined(&cap).await;
        assert_eq!(orch.other_participant_count(), 2);

        cap.reject("participants");
        assert_eq!(orch.other_participant_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reconciliation_shares_when_someone_is_present() {
        let cap = FakeCapability::new();
        cap.set_self(1);
        cap.set_participants(&[1]);
        let (orch, seen) = joined(&cap).await;
        assert!(!orch.reconcile_participants());

        cap.set_participants(&[1, 5]);
        assert!(orch.reconcile_participants());
        assert_eq!(cap.count("start_share"), 1);
        assert_eq!(count(&seen, EventKind::OtherParticipantPresent), 1);

        orch.leave_session().unwrap();
        assert!(!orch.reconcile_participants());
    }

    #[tokio::test(start_paused = true)]
    async fn identity_expiry_surfaces_an_error() {
        let (orch, seen) = orchestrator(None);
        orch.on_identity_expired();
        assert_eq!(
            seen.lock()[0].reason.as_deref(),
            Some("session identity expired")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shut_down_scope_refuses_initialize() {
        let scope = TaskScope::new();
        let orch = SessionOrchestrator::new(
            SessionConfig::default(),
            account(),
            None,
            ObserverBus::new(),
            scope.clone(),
        );
        scope.shutdown(Duration::ZERO).await.unwrap();
        assert!(matches!(orch.initialize(false).await, Err(SessionError::ShutDown)));
    }
}
