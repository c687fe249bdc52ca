//! # Vendor session capability seam.
//!
//! The orchestrator never talks to a vendor library directly. It drives a
//! [`SessionCapability`] (one method per vendor call) and receives native
//! callbacks through [`SessionCallbacks`] (one method per callback kind),
//! which only the event bridge invokes.
//!
//! ```text
//! SessionOrchestrator ── init/authenticate/join/... ──► SessionCapability
//!          ▲
//!          └── on_auth_result/on_session_status/... ◄── EventBridge ◄── native queue
//! ```

use crate::config::{AccountConfig, UnattendedOptions};
use crate::error::CapabilityError;
use crate::session::{Credentials, ParticipantId};

/// Vendor initialization parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitParams {
    /// Vendor web domain.
    pub web_domain: String,
    /// UI language tag.
    pub language: String,
    /// Enables the vendor's own log files.
    pub enable_log: bool,
}

impl InitParams {
    /// Parameters for `web_domain`, English UI, vendor logging on.
    pub fn new(web_domain: impl Into<String>) -> Self {
        Self {
            web_domain: web_domain.into(),
            language: "en".to_string(),
            enable_log: true,
        }
    }
}

/// Parameters of the join call (anonymous participant, direct desktop share).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinParams {
    pub meeting_number: u64,
    pub display_name: String,
    pub passcode: String,
    pub video_off: bool,
    pub audio_off: bool,
    pub direct_share_desktop: bool,
}

impl JoinParams {
    /// Builds join parameters from the account settings.
    ///
    /// Fails when the configured meeting number is not numeric.
    pub fn from_account(account: &AccountConfig) -> Result<Self, CapabilityError> {
        let meeting_number = account.meeting_number.trim().parse::<u64>().map_err(|_| {
            CapabilityError::new(
                "join",
                0,
                format!("meeting number {:?} is not numeric", account.meeting_number),
            )
        })?;
        Ok(Self {
            meeting_number,
            display_name: account.display_name.clone(),
            passcode: account.passcode.clone(),
            video_off: false,
            audio_off: false,
            direct_share_desktop: true,
        })
    }
}

/// Callback sinks the capability can be asked to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// Auth result and identity expiry.
    Auth,
    /// Session status changes.
    Session,
    /// Participant join/leave.
    Participants,
    /// Sharing status changes.
    Sharing,
}

/// Outcome reported by the auth-result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Success,
    /// Rejected with a vendor code.
    Failed(i32),
}

/// Vendor-reported session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session, or a join was cancelled. Ends a live session.
    Idle,
    Connecting,
    WaitingForHost,
    /// Held in the host's waiting room.
    InWaitingRoom,
    InSession,
    Reconnecting,
    Disconnecting,
    Ended,
    Failed,
    /// A status the orchestrator does not act on.
    Other(i32),
}

/// Vendor-reported sharing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingStatus {
    /// Local send began.
    SelfSendBegin,
    /// Local send ended.
    SelfSendEnd,
    /// Nobody is sharing.
    Inactive,
    /// Remote sharing and other states.
    Other(i32),
}

/// What the capability knows about one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub is_self: bool,
}

/// Vendor session library, one method per call.
///
/// Every method is synchronous and non-blocking; results that arrive later
/// are delivered through [`SessionCallbacks`].
pub trait SessionCapability: Send + Sync {
    fn init(&self, params: &InitParams) -> Result<(), CapabilityError>;

    /// Creates the auth and session sub-handles.
    fn create_services(&self) -> Result<(), CapabilityError>;

    /// Wires one callback sink.
    fn register(&self, kind: CallbackKind) -> Result<(), CapabilityError>;

    /// Starts authentication; the result arrives via [`SessionCallbacks::on_auth_result`].
    fn authenticate(&self, credentials: &Credentials) -> Result<(), CapabilityError>;

    fn join(&self, params: &JoinParams) -> Result<(), CapabilityError>;

    fn leave(&self) -> Result<(), CapabilityError>;

    /// Starts sharing the primary display.
    fn start_share(&self) -> Result<(), CapabilityError>;

    /// Tears down every vendor handle.
    fn cleanup(&self) -> Result<(), CapabilityError>;

    fn configure_unattended(&self, options: &UnattendedOptions) -> Result<(), CapabilityError>;

    /// Hides vendor-owned windows, if any are showing.
    fn hide_session_ui(&self) -> Result<(), CapabilityError>;

    /// Current participant list as raw vendor identifiers.
    fn participants(&self) -> Result<Vec<u32>, CapabilityError>;

    fn self_identity(&self) -> Option<ParticipantId>;

    /// Resolves one participant. `Ok(None)` means the vendor does not know it.
    fn lookup(&self, id: ParticipantId) -> Result<Option<ParticipantInfo>, CapabilityError>;
}

/// Native callback sinks, one method per callback kind.
pub trait SessionCallbacks: Send + Sync {
    fn on_auth_result(&self, result: AuthResult);

    fn on_identity_expired(&self);

    fn on_session_status(&self, status: SessionStatus, code: i32);

    fn on_participants_joined(&self, ids: &[ParticipantId]);

    fn on_participants_left(&self, ids: &[ParticipantId]);

    fn on_sharing_status(&self, status: SharingStatus, user: ParticipantId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_params_require_numeric_meeting_number() {
        let mut account = AccountConfig {
            meeting_number: "987 654 321".into(),
            ..AccountConfig::default()
        };
        let err = JoinParams::from_account(&account).unwrap_err();
        assert_eq!(err.op, "join");

        account.meeting_number = " 9876543210 ".into();
        let params = JoinParams::from_account(&account).unwrap();
        assert_eq!(params.meeting_number, 9_876_543_210);
        assert!(params.direct_share_desktop);
        assert!(!params.video_off && !params.audio_off);
    }
}
