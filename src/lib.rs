//! # sessionvisor
//!
//! **Sessionvisor** keeps an unattended video-session endpoint (a kiosk)
//! connected to its session and sharing its screen.
//!
//! It drives a vendor session library through an abstract capability,
//! turns the library's native callbacks into typed session events, and
//! reconnects with exponential backoff when the session is lost. Without a
//! vendor library it runs in a simulation mode that fabricates the same
//! events, so the layers above can be exercised anywhere.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!          ┌─────────────────────────────┐
//!          │ vendor library (native side)│
//!          └──────┬───────────────▲──────┘
//!    native queue │               │ init / authenticate / join / share / leave
//!                 ▼               │
//!     ┌────────────────────┐      │
//!     │    EventBridge     │      │
//!     │ (drain every tick) │      │
//!     └─────────┬──────────┘      │
//!               │ SessionCallbacks│
//!               ▼                 │
//! ┌───────────────────────────────┴───────────────────────────────────┐
//! │  SessionOrchestrator                                              │
//! │  - auth timeout + auth-retry loop                                 │
//! │  - join / share / leave, participant classification               │
//! │  - simulation mode when the capability is missing or failing      │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ emit(Event)
//!                                ▼
//!                     ┌──────────────────────┐
//!                     │     ObserverBus      │──► SubscriberSet ──► async subscribers
//!                     │  (on / once / off)   │
//!                     └──────────┬───────────┘
//!          runtime wiring        │
//!   meetingJoined / sharingStarted / disconnected
//!                                ▼
//!                     ┌──────────────────────┐
//!                     │   RecoveryWatchdog   │── retry timer ──► reconnect()
//!                     │ Idle/Monitoring/     │     (leave → settle → initialize(force))
//!                     │ Recovering/Failed    │
//!                     └──────────────────────┘
//! ```
//!
//! ### Recovery
//! ```text
//! disconnected ──► watchdog.on_disconnected()
//!   ├─► retry_count >= max_retries ─► Failed (needs reset / restart)
//!   └─► arm timer: delay = min(initial × 2^retry_count + jitter, max_backoff)
//!          └─ fires ─► retry_count += 1; reconnect().await
//!                        ├─ Ok  ─► wait for meetingJoined / sharingStarted ─► Monitoring
//!                        └─ Err ─► schedule next attempt or Failed
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                                  |
//! |-------------------|--------------------------------------------------------------------|-----------------------------------------------------|
//! | **Runtime**       | Wires everything, handles OS signals and ordered shutdown.         | [`KioskRuntime`], [`KioskRuntimeBuilder`]           |
//! | **Session**       | Authenticate, join, share and leave against the vendor capability. | [`SessionOrchestrator`], [`SessionCapability`]      |
//! | **Recovery**      | Backoff-driven reconnection with a bounded retry budget.           | [`RecoveryWatchdog`], [`Reconnect`]                 |
//! | **Bridge**        | Drains the native event queue into session callbacks.              | [`EventBridge`], [`NativeEventSource`]              |
//! | **Events**        | Named session events and a synchronous observer bus.               | [`Event`], [`EventKind`], [`ObserverBus`]           |
//! | **Subscriber API**| Async observers with per-subscriber bounded queues.                | [`Subscribe`], [`SubscriberSet`]                    |
//! | **Policies**      | Retry delay curve and jitter.                                      | [`BackoffPolicy`], [`JitterPolicy`]                 |
//! | **Errors**        | Typed errors for capability, session and runtime failures.         | [`CapabilityError`], [`SessionError`], [`RuntimeError`] |
//! | **Configuration** | Centralized timers, retry budgets and account settings.            | [`Config`]                                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sessionvisor::{Config, EventKind, InitOutcome, KioskRuntime};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.session.simulated_join_delay = Duration::from_millis(10);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn sessionvisor::Subscribe>> = vec![Arc::new(sessionvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn sessionvisor::Subscribe>> = Vec::new();
//!
//!     // No capability attached: simulation mode.
//!     let runtime = KioskRuntime::builder(cfg).with_subscribers(subs).build();
//!     runtime.orchestrator().observers().once(EventKind::MeetingJoined, |_| {
//!         println!("joined");
//!     });
//!
//!     let outcome = runtime.start().await?;
//!     assert!(matches!(outcome, InitOutcome::Simulated { .. }));
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert!(runtime.orchestrator().is_in_session());
//!
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

// ---- Public modules ----

pub mod bridge;
pub mod events;
pub mod policies;
pub mod recovery;
pub mod session;
pub mod subscribers;

// ---- Internal modules ----

mod config;
mod core;
mod error;

// ---- Public re-exports ----

pub use bridge::{EventBridge, NativeEvent, NativeEventSource};
pub use config::{AccountConfig, Config, RecoveryConfig, SessionConfig, UnattendedOptions};
pub use crate::core::{
    wait_for_shutdown_signal, KioskRuntime, KioskRuntimeBuilder, TaskScope, TerminationSignal,
    TimerHandle,
};
pub use error::{CapabilityError, RuntimeError, SessionError};
pub use events::{Event, EventKind, ObserverBus};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use recovery::{Reconnect, ReconnectFn, ReconnectRef, RecoveryState, RecoveryWatchdog};
pub use session::{
    InitOutcome, SessionCallbacks, SessionCapability, SessionOrchestrator, SessionPhase,
    SessionSnapshot,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
