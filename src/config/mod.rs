//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or a
//! policy knob does not parse. The database URL is wrapped in
//! secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrets::SecretString;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            notifier: NotifierConfig::from_env()?,
        })
    }
}

/// Which to-do survives when several exist for the same user and document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalPolicy {
    /// Earliest created to-do is kept, the rest are closed.
    #[default]
    OldestWins,
    /// Latest created to-do is kept, the rest are closed.
    NewestWins,
}

impl std::str::FromStr for CanonicalPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" | "oldest_wins" => Ok(Self::OldestWins),
            "newest" | "newest_wins" => Ok(Self::NewestWins),
            other => Err(Error::Config(format!("unknown canonical policy: {other}"))),
        }
    }
}

/// Policy knobs for the workflow notifier.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Base URL used to build document links in mail bodies.
    pub site_url: String,
    /// Transition action whose allowed role approves the current state.
    pub approve_action: String,
    /// Workflow state (and status) that marks a document as rejected.
    pub rejected_state: String,
    /// Identical in-app notifications inside this window are suppressed.
    pub notification_dedup_window: Duration,
    pub canonical_policy: CanonicalPolicy,
    pub send_email: bool,
    /// Hand mail to the host's queue instead of sending inline.
    pub defer_email: bool,
    pub notification_log: bool,
    pub action_email_queue: String,
    pub action_email_job: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:8000".to_string(),
            approve_action: "Approve".to_string(),
            rejected_state: "Rejected".to_string(),
            notification_dedup_window: Duration::from_secs(300),
            canonical_policy: CanonicalPolicy::OldestWins,
            send_email: true,
            defer_email: true,
            notification_log: true,
            action_email_queue: "short".to_string(),
            action_email_job:
                "frappe.workflow.doctype.workflow_action.workflow_action.send_workflow_action_email"
                    .to_string(),
        }
    }
}

impl NotifierConfig {
    /// Read the `ERPSPACE_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            site_url: std::env::var("ERPSPACE_SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            approve_action: std::env::var("ERPSPACE_APPROVE_ACTION")
                .unwrap_or(defaults.approve_action),
            rejected_state: std::env::var("ERPSPACE_REJECTED_STATE")
                .unwrap_or(defaults.rejected_state),
            notification_dedup_window: match std::env::var("ERPSPACE_NOTIFICATION_DEDUP_SECS") {
                Ok(raw) => Duration::from_secs(raw.trim().parse().map_err(|e| {
                    Error::Config(format!("ERPSPACE_NOTIFICATION_DEDUP_SECS={raw}: {e}"))
                })?),
                Err(_) => defaults.notification_dedup_window,
            },
            canonical_policy: match std::env::var("ERPSPACE_CANONICAL_POLICY") {
                Ok(raw) => raw.parse()?,
                Err(_) => defaults.canonical_policy,
            },
            send_email: flag_var("ERPSPACE_SEND_EMAIL", defaults.send_email)?,
            defer_email: flag_var("ERPSPACE_DEFER_EMAIL", defaults.defer_email)?,
            notification_log: flag_var("ERPSPACE_NOTIFICATION_LOG", defaults.notification_log)?,
            action_email_queue: std::env::var("ERPSPACE_ACTION_QUEUE")
                .unwrap_or(defaults.action_email_queue),
            action_email_job: std::env::var("ERPSPACE_ACTION_JOB")
                .unwrap_or(defaults.action_email_job),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn flag_var(name: &str, default: bool) -> Result<bool> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name} is not a boolean: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_policy_parses_short_and_long_names() {
        assert_eq!(
            "oldest".parse::<CanonicalPolicy>().unwrap(),
            CanonicalPolicy::OldestWins
        );
        assert_eq!(
            "Newest_Wins".parse::<CanonicalPolicy>().unwrap(),
            CanonicalPolicy::NewestWins
        );
        assert!("random".parse::<CanonicalPolicy>().is_err());
    }

    #[test]
    fn defaults_use_five_minute_dedup_window() {
        let config = NotifierConfig::default();
        assert_eq!(config.notification_dedup_window, Duration::from_secs(300));
        assert_eq!(config.canonical_policy, CanonicalPolicy::OldestWins);
        assert_eq!(config.approve_action, "Approve");
    }
}
