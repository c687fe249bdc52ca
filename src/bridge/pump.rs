//! # EventBridge: pumps native vendor events into the session layer.
//!
//! A background task that, on every tick, drains **all** queued native
//! events and dispatches them synchronously to a [`SessionCallbacks`] sink,
//! then yields for `interval`.
//!
//! ## Tick
//! ```text
//! loop {
//!   while let Some(ev) = source.poll_event() {
//!     ├─ stop requested ─► exit (queued events are never dispatched)
//!     ├─ Quit           ─► exit
//!     └─ dispatch(ev)   (panics caught and logged, draining continues)
//!   }
//!   sleep(interval)     (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - `start` and `stop` are idempotent.
//! - Once `stop` begins, no further callback is dispatched.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::native::dispatch;
use crate::bridge::{NativeEvent, NativeEventSource};
use crate::core::TaskScope;
use crate::events::panic_message;
use crate::session::SessionCallbacks;

struct Pump {
    scope: TaskScope,
    handle: JoinHandle<()>,
}

/// Adapter between a callback-driven vendor library and the async runtime.
pub struct EventBridge {
    source: Arc<dyn NativeEventSource>,
    sink: Arc<dyn SessionCallbacks>,
    interval: Duration,
    scope: TaskScope,
    pump: Mutex<Option<Pump>>,
}

impl EventBridge {
    /// Creates a stopped bridge. The pump runs on a child of `scope`.
    pub fn new(
        source: Arc<dyn NativeEventSource>,
        sink: Arc<dyn SessionCallbacks>,
        interval: Duration,
        scope: TaskScope,
    ) -> Self {
        Self {
            source,
            sink,
            interval: interval.max(Duration::from_millis(1)),
            scope,
            pump: Mutex::new(None),
        }
    }

    /// Starts pumping. No-op while already running.
    pub fn start(&self) {
        let mut pump = self.pump.lock();
        if pump.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            tracing::debug!("event bridge already running");
            return;
        }

        let scope = self.scope.child();
        let handle = scope.spawn(run_pump(
            self.source.clone(),
            self.sink.clone(),
            self.interval,
            scope.token().clone(),
        ));
        *pump = Some(Pump { scope, handle });
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "event bridge started");
    }

    /// Stops pumping and waits for the pump task to exit. Idempotent.
    pub async fn stop(&self) {
        let pump = self.pump.lock().take();
        let Some(pump) = pump else {
            return;
        };
        pump.scope.cancel();
        if let Err(e) = pump.handle.await {
            tracing::warn!(error = %e, "event pump task failed");
        }
        tracing::info!("event bridge stopped");
    }

    /// `true` while the pump task is alive.
    pub fn is_running(&self) -> bool {
        self.pump
            .lock()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

async fn run_pump(
    source: Arc<dyn NativeEventSource>,
    sink: Arc<dyn SessionCallbacks>,
    interval: Duration,
    token: CancellationToken,
) {
    loop {
        let mut drained = 0usize;
        while !token.is_cancelled() {
            let Some(event) = source.poll_event() else {
                break;
            };
            if event == NativeEvent::Quit {
                tracing::info!("native queue requested quit, pump exiting");
                return;
            }

            let name = event.as_str();
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| dispatch(sink.as_ref(), event))) {
                tracing::error!(
                    event = name,
                    info = %panic_message(panic.as_ref()),
                    "native callback panicked"
                );
            }
            drained += 1;
        }
        if token.is_cancelled() {
            return;
        }
        if drained > 0 {
            tracing::trace!(drained, "native events dispatched");
        }
        tokio::time::sleep(interval).await;
    }
}
