//! # Async session-event subscribers.
//!
//! The [`ObserverBus`](crate::events::ObserverBus) runs its `on`/`once`
//! handlers inline, on the task that emitted the event. Anything that has to
//! await (an alert webhook, an uptime report, a log shipper) implements
//! [`Subscribe`] instead and is handed a copy of the event after the inline
//! handlers ran.
//!
//! A session that keeps dropping produces `disconnected` and `error` bursts.
//! Each subscriber drains its own bounded queue on its own worker, so a stuck
//! webhook never delays the watchdog or the other subscribers. When the queue
//! is full the newest event is dropped for that subscriber and a warning is
//! logged. A panic inside [`Subscribe::on_event`] is logged and the worker
//! moves on to the next event.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use async_trait::async_trait;
//! use sessionvisor::{Event, EventKind, Subscribe};
//!
//! /// Counts drops and pages the on-call after three in a row.
//! struct DropAlert {
//!     streak: AtomicU32,
//! }
//!
//! #[async_trait]
//! impl Subscribe for DropAlert {
//!     async fn on_event(&self, ev: &Event) {
//!         match ev.kind {
//!             EventKind::MeetingJoined => self.streak.store(0, Ordering::Relaxed),
//!             EventKind::Disconnected => {
//!                 let streak = self.streak.fetch_add(1, Ordering::Relaxed) + 1;
//!                 if streak >= 3 {
//!                     let why = ev.reason.as_deref().unwrap_or("unknown");
//!                     eprintln!("kiosk keeps dropping: {why}");
//!                 }
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "drop-alert"
//!     }
//!
//!     // Only drops matter; a short queue is enough.
//!     fn queue_capacity(&self) -> usize {
//!         32
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives every session event emitted by the orchestrator.
///
/// `on_event` must not block the executor; errors stay inside the
/// subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in emission order.
    async fn on_event(&self, event: &Event);

    /// Label used in queue-overflow and panic logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events buffered before new ones are dropped. Clamped to at least 1.
    fn queue_capacity(&self) -> usize {
        256
    }
}
