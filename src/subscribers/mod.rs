//! # Async event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver session events to application observers that need
//! to do async work (audit trails, alerting, dashboards) without blocking the
//! orchestrator.
//!
//! ## Architecture
//! ```text
//! SessionOrchestrator ── emit(Event) ──► ObserverBus ──► sync handlers (runtime wiring)
//!                                            │
//!                                            └──► SubscriberSet::emit(&Event)
//!                                                   ├──► [queue] ─► LogWriter
//!                                                   └──► [queue] ─► custom subscriber
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
