//! # Kiosk Example
//!
//! Runs the kiosk runtime in simulation mode (no vendor library attached).
//!
//! The script below drives the session through a typical day:
//! - a remote participant joins, the endpoint starts sharing
//! - the session ends, the watchdog reconnects with backoff
//!
//! Press Ctrl-C to shut down.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example kiosk
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    time::Duration,
};

use sessionvisor::session::{ParticipantId, SessionStatus};
use sessionvisor::{
    Config, Event, EventKind, KioskRuntime, LogWriter, SessionCallbacks, Subscribe,
};
use tracing_subscriber::EnvFilter;

struct Uptime {
    joins: AtomicU64,
    drops: AtomicU64,
}

#[async_trait::async_trait]
impl Subscribe for Uptime {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::MeetingJoined => {
                self.joins.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::Disconnected => {
                self.drops.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
    fn name(&self) -> &'static str {
        "uptime"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cfg = Config::default();
    cfg.account.meeting_number = "1234567890".into();
    cfg.recovery.max_retries = 3;

    let uptime = Arc::new(Uptime {
        joins: AtomicU64::new(0),
        drops: AtomicU64::new(0),
    });
    let runtime = KioskRuntime::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new()), uptime.clone()])
        .build();

    let script = Arc::clone(&runtime);
    tokio::spawn(async move {
        let orch = script.orchestrator();

        tokio::time::sleep(Duration::from_secs(3)).await;
        println!(" ├─► remote participant joins");
        orch.on_participants_joined(&[ParticipantId(16778240)]);

        tokio::time::sleep(Duration::from_secs(3)).await;
        println!(" ├─► host ends the session");
        orch.on_session_status(SessionStatus::Ended, 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        println!(
            " └─► watchdog: {} (retries {}), phase: {}",
            script.watchdog().state(),
            script.watchdog().retry_count(),
            orch.phase().as_label()
        );
    });

    runtime.run().await?;

    println!();
    println!("Uptime:");
    println!(" ├─► Joins: {}", uptime.joins.load(Ordering::Relaxed));
    println!(" └─► Drops: {}", uptime.drops.load(Ordering::Relaxed));
    Ok(())
}
