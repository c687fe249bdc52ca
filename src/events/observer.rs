//! # Observer bus for session events.
//!
//! [`ObserverBus`] is a synchronous publish/subscribe registry: a mapping from
//! [`EventKind`] to an ordered list of handlers.
//!
//! ## Rules
//! - Handlers run **in registration order**, synchronously, inside `emit`.
//! - `emit` snapshots the handler list first, so handlers may call `on`,
//!   `once` or `off` re-entrantly.
//! - A `once` handler is a flag-checked wrapper: the first invocation flips
//!   the flag and the entry is unregistered after that emit.
//! - A panicking handler is caught and logged; remaining handlers still run.
//! - When a [`SubscriberSet`] is attached, every emitted event is also
//!   forwarded to the async subscribers (non-blocking).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use sessionvisor::{Event, EventKind, ObserverBus};
//!
//! let bus = ObserverBus::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = hits.clone();
//! bus.once(EventKind::MeetingJoined, move |_| { h.fetch_add(1, Ordering::SeqCst); });
//!
//! bus.emit(Event::new(EventKind::MeetingJoined));
//! bus.emit(Event::new(EventKind::MeetingJoined));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{Event, EventKind};
use crate::subscribers::SubscriberSet;

/// Shared handler reference.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registration identifier returned by [`ObserverBus::on`] / [`ObserverBus::once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Clone)]
struct Entry {
    id: HandlerId,
    handler: Handler,
    /// `Some` for `once` registrations; set to `true` on first invocation.
    fired: Option<Arc<AtomicBool>>,
}

/// Ordered event-tag → handlers registry.
#[derive(Default)]
pub struct ObserverBus {
    handlers: Mutex<HashMap<EventKind, Vec<Entry>>>,
    next_id: AtomicU64,
    sink: Option<Arc<SubscriberSet>>,
}

impl ObserverBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bus that also forwards every event to `sink`.
    pub fn with_subscribers(sink: Arc<SubscriberSet>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    /// Registers `handler` for `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(handler), None)
    }

    /// Registers `handler` for the next `kind` event only.
    pub fn once<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(handler), Some(Arc::new(AtomicBool::new(false))))
    }

    /// Unregisters a handler. Returns `false` if it was not registered.
    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.id != id);
        before != list.len()
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every handler registered for its kind, in order.
    pub fn emit(&self, event: Event) {
        let entries: Vec<Entry> = self
            .handlers
            .lock()
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();

        let mut spent = Vec::new();
        for entry in &entries {
            if let Some(fired) = &entry.fired {
                if fired.swap(true, Ordering::SeqCst) {
                    continue;
                }
                spent.push(entry.id);
            }
            let handler = &entry.handler;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                tracing::error!(
                    event = event.kind.as_str(),
                    info = %panic_message(panic.as_ref()),
                    "event handler panicked"
                );
            }
        }

        if !spent.is_empty() {
            if let Some(list) = self.handlers.lock().get_mut(&event.kind) {
                list.retain(|e| !spent.contains(&e.id));
            }
        }

        if let Some(sink) = &self.sink {
            sink.emit(&event);
        }
    }

    fn register(
        &self,
        kind: EventKind,
        handler: Handler,
        fired: Option<Arc<AtomicBool>>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push(Entry { id, handler, fired });
        id
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
