//! Configuration for the Slack RTM adapter.
//!
//! # Example Configuration
//!
//! ```toml
//! [providers.slack]
//! bot_token = "xoxb-..."
//!
//! [rtm]
//! enabled = true
//! ping_interval_secs = 30
//!
//! [rtm.reconnect]
//! initial_delay_ms = 1000
//! max_delay_ms = 60000
//! multiplier = 2.0
//! ```

use std::time::Duration;

use courier_transport::Backoff;
use serde::{Deserialize, Serialize};

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Slack provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bearer token for `rtm.connect`.
    pub bot_token: Option<String>,

    /// Web API base URL, overridable for testing.
    pub api_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// RTM session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RtmConfig {
    /// Whether the RTM adapter is started at all.
    pub enabled: bool,

    /// Keep-alive ping period in seconds.
    pub ping_interval_secs: u64,

    /// Reconnect backoff.
    pub reconnect: ReconnectConfig,
}

impl Default for RtmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ping_interval_secs: 30,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl RtmConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.multiplier,
        )
    }
}
