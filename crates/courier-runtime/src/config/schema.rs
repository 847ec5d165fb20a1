//! Configuration schema definitions.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [providers.line]
//! channel_secret = "..."
//! channel_token = "..."
//!
//! [providers.slack]
//! bot_token = "xoxb-..."
//!
//! [rtm]
//! enabled = true
//!
//! [executor]
//! workers = 8
//! reply_timeout_secs = 10
//! ack_mode = "fire-and-return"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [logging.filters]
//! courier_adapter_slack = "debug"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use courier_adapter_line::LineConfig;
use courier_adapter_slack::{RtmConfig, SlackConfig};
use courier_framework::AckMode;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Webhook listener.
    pub server: ServerConfig,

    /// Per-provider credentials.
    pub providers: ProvidersConfig,

    /// Slack RTM session.
    pub rtm: RtmConfig,

    /// Handler work pool and reply delivery.
    pub executor: ExecutorConfig,

    /// Logging setup.
    pub logging: LoggingConfig,
}

// =============================================================================
// Server
// =============================================================================

/// Address the webhook routes are served on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` as accepted by the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Provider sections, keyed by platform name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub line: LineConfig,
    pub slack: SlackConfig,
}

// =============================================================================
// Executor
// =============================================================================

/// Work pool and egress settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of events processed concurrently.
    pub workers: usize,

    /// Events queued on top of the running ones; a full queue rejects
    /// webhook events with `500`.
    pub queue_capacity: usize,

    /// Per-call timeout for reply delivery, in seconds.
    pub reply_timeout_secs: u64,

    /// When a webhook is acknowledged relative to its dispatch.
    pub ack_mode: AckMode,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            queue_capacity: 1024,
            reply_timeout_secs: 10,
            ack_mode: AckMode::default(),
        }
    }
}

impl ExecutorConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level, overridden by `RUST_LOG`.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Log file, used when `output = "file"`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,

    /// Include thread ids.
    pub thread_ids: bool,

    /// Include source file and line.
    pub file_location: bool,

    /// Per-module levels, e.g. `courier_adapter_slack = "debug"`.
    pub filters: HashMap<String, LogLevel>,

    pub span_events: SpanEventConfig,
}
