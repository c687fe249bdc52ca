//! # LogWriter: event logger
//!
//! A minimal subscriber that renders every session [`Event`] through `tracing`.
//!
//! ## Example output
//! ```text
//! INFO  session event event="initialized" seq=0
//! INFO  session event event="meetingJoined" seq=1
//! WARN  session event event="disconnected" seq=4 reason="session ended"
//! ERROR session event event="error" seq=5 reason="authentication timeout"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::Error => {
                tracing::error!(event = e.kind.as_str(), seq = e.seq, reason, "session event");
            }
            EventKind::Disconnected | EventKind::SharingStopped => {
                tracing::warn!(event = e.kind.as_str(), seq = e.seq, reason, "session event");
            }
            EventKind::Initialized
            | EventKind::MeetingJoined
            | EventKind::SharingStarted
            | EventKind::OtherParticipantPresent => {
                tracing::info!(event = e.kind.as_str(), seq = e.seq, "session event");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
