//! Runtime core: wiring and lifecycle.
//!
//! The public API from this module is [`KioskRuntime`] (built with
//! [`KioskRuntimeBuilder`]) and the [`TaskScope`] every background task is
//! spawned on.
//!
//! Internal modules:
//! - [`scope`]: cancellation domain, task tracking and one-shot timers;
//! - [`runtime`]: event wiring between orchestrator, watchdog and bridge, ordered shutdown;
//! - [`poller`]: fallback participant poller;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod poller;
mod runtime;
mod scope;
mod shutdown;

pub use builder::KioskRuntimeBuilder;
pub use runtime::KioskRuntime;
pub use scope::{TaskScope, TimerHandle};
pub use shutdown::{wait_for_shutdown_signal, TerminationSignal};
