//! Event bridge between the vendor's native event queue and the session layer.
//!
//! - [`NativeEvent`], [`NativeEventSource`]: what the vendor queue yields and how it is polled;
//! - [`EventBridge`]: the cooperative pump that drains the queue into
//!   [`SessionCallbacks`](crate::session::SessionCallbacks).

mod native;
mod pump;

pub use native::{NativeEvent, NativeEventSource};
pub use pump::EventBridge;
