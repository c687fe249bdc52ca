//! Scripted capability for tests: records calls, rejects on demand and
//! serves queued native events to the bridge.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::{NativeEvent, NativeEventSource};
use crate::config::UnattendedOptions;
use crate::error::CapabilityError;
use crate::session::{
    CallbackKind, Credentials, InitParams, JoinParams, ParticipantId, ParticipantInfo,
    SessionCapability,
};

#[derive(Default)]
pub(crate) struct FakeCapability {
    calls: Mutex<Vec<&'static str>>,
    rejected: Mutex<HashSet<&'static str>>,
    participants: Mutex<Vec<u32>>,
    self_id: Mutex<Option<u32>>,
    known: Mutex<HashMap<u32, bool>>,
    events: Mutex<VecDeque<NativeEvent>>,
    registered: Mutex<Vec<CallbackKind>>,
}

impl FakeCapability {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later `op` call fail.
    pub(crate) fn reject(&self, op: &'static str) {
        self.rejected.lock().insert(op);
    }

    pub(crate) fn accept(&self, op: &'static str) {
        self.rejected.lock().remove(op);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == op).count()
    }

    pub(crate) fn registered(&self) -> Vec<CallbackKind> {
        self.registered.lock().clone()
    }

    pub(crate) fn set_participants(&self, ids: &[u32]) {
        *self.participants.lock() = ids.to_vec();
    }

    pub(crate) fn set_self(&self, id: u32) {
        *self.self_id.lock() = Some(id);
        self.known.lock().insert(id, true);
    }

    /// Makes `id` resolvable by `lookup`.
    pub(crate) fn know(&self, id: u32, is_self: bool) {
        self.known.lock().insert(id, is_self);
    }

    /// Queues a native event for the bridge.
    pub(crate) fn push(&self, event: NativeEvent) {
        self.events.lock().push_back(event);
    }

    pub(crate) fn queued(&self) -> usize {
        self.events.lock().len()
    }

    fn record(&self, op: &'static str) -> Result<(), CapabilityError> {
        self.calls.lock().push(op);
        if self.rejected.lock().contains(op) {
            return Err(CapabilityError::new(op, 1, "rejected by fake"));
        }
        Ok(())
    }
}

impl SessionCapability for FakeCapability {
    fn init(&self, _params: &InitParams) -> Result<(), CapabilityError> {
        self.record("init")
    }

    fn create_services(&self) -> Result<(), CapabilityError> {
        self.record("create_services")
    }

    fn register(&self, kind: CallbackKind) -> Result<(), CapabilityError> {
        self.record("register")?;
        self.registered.lock().push(kind);
        Ok(())
    }

    fn authenticate(&self, _credentials: &Credentials) -> Result<(), CapabilityError> {
        self.record("authenticate")
    }

    fn join(&self, _params: &JoinParams) -> Result<(), CapabilityError> {
        self.record("join")
    }

    fn leave(&self) -> Result<(), CapabilityError> {
        self.record("leave")
    }

    fn start_share(&self) -> Result<(), CapabilityError> {
        self.record("start_share")
    }

    fn cleanup(&self) -> Result<(), CapabilityError> {
        self.registered.lock().clear();
        self.record("cleanup")
    }

    fn configure_unattended(&self, _options: &UnattendedOptions) -> Result<(), CapabilityError> {
        self.record("configure_unattended")
    }

    fn hide_session_ui(&self) -> Result<(), CapabilityError> {
        self.record("hide_session_ui")
    }

    fn participants(&self) -> Result<Vec<u32>, CapabilityError> {
        self.record("participants")?;
        Ok(self.participants.lock().clone())
    }

    fn self_identity(&self) -> Option<ParticipantId> {
        self.self_id.lock().map(ParticipantId)
    }

    fn lookup(&self, id: ParticipantId) -> Result<Option<ParticipantInfo>, CapabilityError> {
        self.record("lookup")?;
        Ok(self
            .known
            .lock()
            .get(&id.0)
            .map(|is_self| ParticipantInfo {
                id,
                is_self: *is_self,
            }))
    }
}

impl NativeEventSource for FakeCapability {
    fn poll_event(&self) -> Option<NativeEvent> {
        self.events.lock().pop_front()
    }
}
