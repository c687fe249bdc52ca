//! Native vendor events and their dispatch onto [`SessionCallbacks`].

use crate::session::{
    participant_ids, AuthResult, ParticipantId, SessionCallbacks, SessionStatus, SharingStatus,
};

/// One entry of the vendor's native event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    AuthResult(AuthResult),
    IdentityExpired,
    SessionStatus { status: SessionStatus, code: i32 },
    /// Raw vendor participant identifiers.
    ParticipantsJoined(Vec<u32>),
    ParticipantsLeft(Vec<u32>),
    SharingStatus { status: SharingStatus, user: u32 },
    /// The vendor asked the pump to stop.
    Quit,
}

impl NativeEvent {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeEvent::AuthResult(_) => "auth_result",
            NativeEvent::IdentityExpired => "identity_expired",
            NativeEvent::SessionStatus { .. } => "session_status",
            NativeEvent::ParticipantsJoined(_) => "participants_joined",
            NativeEvent::ParticipantsLeft(_) => "participants_left",
            NativeEvent::SharingStatus { .. } => "sharing_status",
            NativeEvent::Quit => "quit",
        }
    }
}

/// Non-blocking access to the vendor's native event queue.
pub trait NativeEventSource: Send + Sync {
    /// Removes and returns the next queued event, or `None` when the queue is empty.
    fn poll_event(&self) -> Option<NativeEvent>;
}

/// Invokes the callback matching `event`. `Quit` is handled by the pump.
pub(crate) fn dispatch(sink: &dyn SessionCallbacks, event: NativeEvent) {
    match event {
        NativeEvent::AuthResult(result) => sink.on_auth_result(result),
        NativeEvent::IdentityExpired => sink.on_identity_expired(),
        NativeEvent::SessionStatus { status, code } => sink.on_session_status(status, code),
        NativeEvent::ParticipantsJoined(raw) => sink.on_participants_joined(&participant_ids(raw)),
        NativeEvent::ParticipantsLeft(raw) => sink.on_participants_left(&participant_ids(raw)),
        NativeEvent::SharingStatus { status, user } => {
            sink.on_sharing_status(status, ParticipantId(user))
        }
        NativeEvent::Quit => {}
    }
}
