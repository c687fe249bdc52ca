//! # Session lifecycle events.
//!
//! The [`EventKind`] enum names the seven events the orchestrator emits.
//! The [`Event`] struct carries an ordering sequence, a timestamp and an
//! optional reason (the disconnect reason or the error message).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically.
//!
//! ## Example
//! ```rust
//! use sessionvisor::{Event, EventKind};
//!
//! let ev = Event::disconnected("session ended");
//!
//! assert_eq!(ev.kind, EventKind::Disconnected);
//! assert_eq!(ev.reason.as_deref(), Some("session ended"));
//! assert_eq!(ev.kind.as_str(), "disconnected");
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Authentication succeeded (or simulation mode came up).
    Initialized,
    /// The endpoint entered the session.
    MeetingJoined,
    /// Local sharing began.
    SharingStarted,
    /// Local sharing ended while still in-session.
    SharingStopped,
    /// At least one participant other than the local identity is present.
    OtherParticipantPresent,
    /// The session ended or failed.
    ///
    /// Sets:
    /// - `reason`: human-readable cause
    Disconnected,
    /// A recoverable or terminal problem worth surfacing.
    ///
    /// Sets:
    /// - `reason`: error message
    Error,
}

impl EventKind {
    /// Returns the wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Initialized => "initialized",
            EventKind::MeetingJoined => "meetingJoined",
            EventKind::SharingStarted => "sharingStarted",
            EventKind::SharingStopped => "sharingStopped",
            EventKind::OtherParticipantPresent => "otherParticipantPresent",
            EventKind::Disconnected => "disconnected",
            EventKind::Error => "error",
        }
    }
}

/// Session event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Disconnect reason or error message.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a `disconnected(reason)` event.
    #[inline]
    pub fn disconnected(reason: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::Disconnected).with_reason(reason)
    }

    /// Creates an `error(message)` event.
    #[inline]
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::Error).with_reason(message)
    }
}
