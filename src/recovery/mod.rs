//! Connection recovery.
//!
//! This module contains the [`RecoveryWatchdog`]: a four-state machine over
//! the *connection* lifecycle that arms a single backoff-delayed retry timer
//! and calls back into the session layer through a [`Reconnect`] handle.
//!
//! ## Contents
//! - [`RecoveryState`] `Idle | Monitoring | Recovering | Failed`
//! - [`RecoveryWatchdog`] the state machine and retry scheduler
//! - [`Reconnect`], [`ReconnectFn`] the reconnect callback seam
//!
//! ## State machine
//! ```text
//!            start                 on_disconnected
//!   Idle ───────────► Monitoring ──────────────────► Recovering ◄──┐ on_disconnected
//!    ▲                   ▲  ▲                          │  │  │     │ (cancel + reset)
//!    │ stop (any)        │  └──── on_connected ────────┘  │  └─────┘
//!    │                   │        on_sharing_restored     │ retries exhausted
//!    │                   └──────── reset ─────────── Failed ◄┘
//!    │                                                  │ on_disconnected → Recovering
//! ```

mod reconnect;
mod state;
mod watchdog;

pub use reconnect::{Reconnect, ReconnectFn, ReconnectRef};
pub use state::RecoveryState;
pub use watchdog::RecoveryWatchdog;
