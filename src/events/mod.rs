//! Session events: types and observer bus.
//!
//! This module groups the event **data model** and the **observer bus** used
//! by the session orchestrator to notify the application layer and the
//! recovery watchdog of lifecycle transitions.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`ObserverBus`] `on`/`once`/`off`/`emit` registry, optionally forwarding
//!   to async [`SubscriberSet`](crate::SubscriberSet) workers
//!
//! ## Quick reference
//! - **Publisher**: `SessionOrchestrator` (its callback handlers and entry points).
//! - **Consumers**: the runtime wiring (`KioskRuntime`), which drives the
//!   watchdog, and any application handler or subscriber.

mod event;
mod observer;

pub use event::{Event, EventKind};
pub use observer::{Handler, HandlerId, ObserverBus};

pub(crate) use observer::panic_message;
