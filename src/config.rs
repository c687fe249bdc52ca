//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for the kiosk runtime, split by
//! concern:
//! - [`RecoveryConfig`] watchdog retry budget and backoff curve;
//! - [`SessionConfig`] orchestrator timers and auth-retry budget;
//! - [`AccountConfig`] credentials and the session to join.
//!
//! Loading and persisting configuration is left to the embedding
//! application; this module only defines the shape, defaults and
//! [`Config::sanitize`].

use std::time::Duration;

use crate::policies::JitterPolicy;

/// Global configuration for the kiosk runtime.
///
/// ## Field semantics
/// - `pump_interval`: yield between two drains of the native event queue
/// - `participant_poll_interval`: period of the fallback participant poller
/// - `grace`: maximum wait for background tasks during shutdown (`0s` = do not wait)
#[derive(Clone, Debug)]
pub struct Config {
    /// Watchdog settings.
    pub recovery: RecoveryConfig,
    /// Orchestrator settings.
    pub session: SessionConfig,
    /// Credentials and session identity.
    pub account: AccountConfig,
    /// Event bridge tick.
    pub pump_interval: Duration,
    /// Fallback participant poll period.
    pub participant_poll_interval: Duration,
    /// Shutdown grace period.
    pub grace: Duration,
}

/// Watchdog retry budget and backoff curve.
#[derive(Clone, Copy, Debug)]
pub struct RecoveryConfig {
    /// Number of reconnect attempts before entering `Failed` (min 1).
    pub max_retries: u32,
    /// Delay before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Cap applied to every computed delay.
    pub max_backoff: Duration,
    /// Random component added to every delay.
    pub jitter: JitterPolicy,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(30_000),
            jitter: JitterPolicy::default(),
        }
    }
}

/// Orchestrator timers and auth-retry budget.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How long to wait for the auth-result callback.
    pub auth_timeout: Duration,
    /// Re-initialize attempts after auth timeouts or failures.
    pub max_auth_retries: u32,
    /// Delay before a re-initialize caused by auth trouble.
    pub auth_retry_delay: Duration,
    /// Wait after tearing down vendor handles on a forced reload.
    pub reload_settle: Duration,
    /// Wait after vendor `init` before creating sub-handles.
    pub init_settle: Duration,
    /// Delay before the synthetic in-session transition in simulation mode.
    pub simulated_join_delay: Duration,
    /// Wait before sharing when others are already present on join.
    pub share_settle: Duration,
    /// Extra attempts at hiding vendor UI after joining.
    pub ui_hide_delays: Vec<Duration>,
    /// Vendor web domain passed at init.
    pub web_domain: String,
    /// Dialog/behaviour switches applied for unattended operation.
    pub unattended: UnattendedOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(10),
            max_auth_retries: 5,
            auth_retry_delay: Duration::from_secs(5),
            reload_settle: Duration::from_secs(1),
            init_settle: Duration::from_millis(500),
            simulated_join_delay: Duration::from_secs(1),
            share_settle: Duration::from_secs(1),
            ui_hide_delays: vec![Duration::from_millis(500), Duration::from_secs(1)],
            web_domain: "https://www.zoom.us".to_string(),
            unattended: UnattendedOptions::default(),
        }
    }
}

/// Vendor dialog switches for unattended operation.
///
/// Every `true` suppresses the corresponding prompt, except
/// `show_remote_control_button` which keeps the control visible to remote users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnattendedOptions {
    pub suppress_password_dialog: bool,
    pub suppress_screen_name_dialog: bool,
    pub suppress_join_audio_dialog: bool,
    pub suppress_join_window: bool,
    pub suppress_waiting_for_host_dialog: bool,
    pub suppress_wrong_password_popup: bool,
    pub suppress_remote_control_decline_dialog: bool,
    pub show_remote_control_button: bool,
}

impl Default for UnattendedOptions {
    fn default() -> Self {
        Self {
            suppress_password_dialog: true,
            suppress_screen_name_dialog: true,
            suppress_join_audio_dialog: true,
            suppress_join_window: true,
            suppress_waiting_for_host_dialog: true,
            suppress_wrong_password_popup: true,
            suppress_remote_control_decline_dialog: true,
            show_remote_control_button: true,
        }
    }
}

/// Credentials and the session to join.
#[derive(Clone, Debug)]
pub struct AccountConfig {
    pub sdk_key: String,
    pub sdk_secret: String,
    /// Numeric meeting identifier (kept as text, validated on join).
    pub meeting_number: String,
    pub passcode: String,
    pub display_name: String,
    /// Lifetime of signed auth tokens.
    pub token_ttl: Duration,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            sdk_key: String::new(),
            sdk_secret: String::new(),
            meeting_number: String::new(),
            passcode: String::new(),
            display_name: "REMOTE-PC-01".to_string(),
            token_ttl: Duration::from_secs(60 * 60 * 24),
        }
    }
}

impl Config {
    /// Clamps invalid values in place and returns human-readable warnings.
    ///
    /// - `max_retries = 0` → 1
    /// - `max_backoff < initial_backoff` → `initial_backoff`
    /// - missing key, secret or meeting number are reported but left as is
    ///
    /// Every warning is also logged.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.account.sdk_key.is_empty() {
            warnings.push("sdk key is not configured".to_string());
        }
        if self.account.sdk_secret.is_empty() {
            warnings.push("sdk secret is not configured".to_string());
        }
        if self.account.meeting_number.is_empty() {
            warnings.push("meeting number is not configured".to_string());
        }
        if self.recovery.max_retries < 1 {
            self.recovery.max_retries = 1;
            warnings.push("invalid max retries, defaulting to 1".to_string());
        }
        if self.recovery.max_backoff < self.recovery.initial_backoff {
            self.recovery.max_backoff = self.recovery.initial_backoff;
            warnings.push("max backoff below initial backoff, raised to match".to_string());
        }

        for w in &warnings {
            tracing::warn!(warning = %w, "configuration");
        }
        warnings
    }

    /// Returns a bridge tick clamped to at least 1ms.
    #[inline]
    pub fn pump_interval_clamped(&self) -> Duration {
        self.pump_interval.max(Duration::from_millis(1))
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `pump_interval = 10ms`
    /// - `participant_poll_interval = 2s`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            recovery: RecoveryConfig::default(),
            session: SessionConfig::default(),
            account: AccountConfig::default(),
            pump_interval: Duration::from_millis(10),
            participant_poll_interval: Duration::from_secs(2),
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_values() {
        let cfg = Config::default();
        assert_eq!(cfg.recovery.max_retries, 10);
        assert_eq!(cfg.recovery.initial_backoff, Duration::from_secs(1));
        assert_eq!(cfg.recovery.max_backoff, Duration::from_secs(30));
        assert_eq!(cfg.session.auth_timeout, Duration::from_secs(10));
        assert_eq!(cfg.session.max_auth_retries, 5);
        assert_eq!(cfg.pump_interval, Duration::from_millis(10));
        assert_eq!(cfg.participant_poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.grace, Duration::from_secs(5));
    }

    #[test]
    fn sanitize_clamps_retry_budget() {
        let mut cfg = Config::default();
        cfg.recovery.max_retries = 0;
        cfg.recovery.max_backoff = Duration::from_millis(10);

        let warnings = cfg.sanitize();
        assert_eq!(cfg.recovery.max_retries, 1);
        assert_eq!(cfg.recovery.max_backoff, cfg.recovery.initial_backoff);
        assert!(warnings.iter().any(|w| w.contains("max retries")));
    }

    #[test]
    fn sanitize_reports_missing_credentials() {
        let mut cfg = Config::default();
        let warnings = cfg.sanitize();
        assert_eq!(warnings.len(), 3);

        cfg.account.sdk_key = "key".into();
        cfg.account.sdk_secret = "secret".into();
        cfg.account.meeting_number = "1234567890".into();
        assert!(cfg.sanitize().is_empty());
    }
}
