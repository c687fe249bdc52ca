//! Participant identities and the local-vs-other classification.
//!
//! Membership is never cached: every question about "who is here" goes to
//! the capability. An identity counts as *other* unless it is positively
//! matched to the local one.

use crate::session::SessionCapability;

/// Vendor participant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u32);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Converts a raw vendor participant list into ordered identities.
///
/// Order is preserved; repeated identifiers are kept once.
pub fn participant_ids(raw: impl IntoIterator<Item = u32>) -> Vec<ParticipantId> {
    let mut out: Vec<ParticipantId> = Vec::new();
    for id in raw.into_iter().map(ParticipantId) {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Result of matching an identity against the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Positively the local endpoint.
    Local,
    /// Positively someone else.
    Other,
    /// Could not be resolved.
    Unresolved,
}

impl Classification {
    /// Unresolved identities count as other participants.
    pub fn counts_as_other(self) -> bool {
        !matches!(self, Classification::Local)
    }
}

/// Classifies `id` using the capability's self identity and lookup.
pub fn classify(capability: &dyn SessionCapability, id: ParticipantId) -> Classification {
    if capability.self_identity() == Some(id) {
        return Classification::Local;
    }
    match capability.lookup(id) {
        Ok(Some(info)) if info.is_self => Classification::Local,
        Ok(Some(_)) => Classification::Other,
        Ok(None) => Classification::Unresolved,
        Err(e) => {
            tracing::debug!(participant = %id, error = %e, "participant lookup failed");
            Classification::Unresolved
        }
    }
}
