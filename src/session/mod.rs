//! Session lifecycle: the vendor capability seam, credentials, participant
//! resolution and the [`SessionOrchestrator`].
//!
//! - [`capability`]: [`SessionCapability`] (calls) and [`SessionCallbacks`] (native callbacks);
//! - [`credentials`]: signed auth tokens;
//! - [`participants`]: typed participant identities and local/other classification;
//! - [`orchestrator`]: the session state machine and its auth-retry loop.

mod capability;
mod credentials;
mod orchestrator;
mod participants;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{
    AuthResult, CallbackKind, InitParams, JoinParams, ParticipantInfo, SessionCallbacks,
    SessionCapability, SessionStatus, SharingStatus,
};
pub use credentials::Credentials;
pub use orchestrator::{InitOutcome, SessionOrchestrator, SessionPhase, SessionSnapshot};
pub use participants::{classify, participant_ids, Classification, ParticipantId};
