//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → logged, worker continues
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, a warning is logged
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{panic_message, Event};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Mutex<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::error!(
                            subscriber = sub.name(),
                            info = %panic_message(panic_err.as_ref()),
                            "subscriber panicked"
                        );
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels: Mutex::new(channels),
            workers: Mutex::new(workers),
        }
    }

    /// Number of live subscriber queues.
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Returns `true` when no subscriber is attached (or after shutdown).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        for channel in self.channels.lock().iter() {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = channel.name,
                        event = event.kind.as_str(),
                        "subscriber queue full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(
                        subscriber = channel.name,
                        event = event.kind.as_str(),
                        "subscriber worker closed, event dropped"
                    );
                }
            }
        }
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// 1. Drops all channel senders (workers drain their queue, then see the channel closed)
    /// 2. Awaits all worker tasks to finish
    ///
    /// Idempotent; later `emit` calls are no-ops.
    pub async fn shutdown(&self) {
        drop(std::mem::take(&mut *self.channels.lock()));

        let workers = std::mem::take(&mut *self.workers.lock());
        for h in workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Collect {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explodes;

    #[async_trait]
    impl Subscribe for Explodes {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber exploded");
        }
    }

    #[tokio::test]
    async fn delivers_in_fifo_order_and_drains_on_shutdown() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![Arc::new(Collect { seen: seen.clone() })]);

        set.emit(&Event::new(EventKind::Initialized));
        set.emit(&Event::new(EventKind::MeetingJoined));
        set.shutdown().await;

        assert_eq!(*seen.lock(), vec![EventKind::Initialized, EventKind::MeetingJoined]);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn panicking_subscriber_is_isolated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(vec![
            Arc::new(Explodes),
            Arc::new(Collect { seen: seen.clone() }),
        ]);

        set.emit(&Event::error("one"));
        set.emit(&Event::error("two"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        set.shutdown().await;

        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn emit_after_shutdown_is_noop() {
        let set = SubscriberSet::new(Vec::new());
        set.shutdown().await;
        set.emit(&Event::new(EventKind::Initialized));
        set.shutdown().await;
    }
}
