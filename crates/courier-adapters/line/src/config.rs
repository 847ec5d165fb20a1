//! Configuration for the LINE adapter.
//!
//! # Example Configuration
//!
//! ```toml
//! [providers.line]
//! enabled = true
//! channel_secret = "..."
//! channel_token = "..."
//! ```

use serde::{Deserialize, Serialize};

/// Default LINE API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// LINE adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Whether the webhook route is mounted.
    pub enabled: bool,

    /// Key for the webhook signature HMAC.
    pub channel_secret: Option<String>,

    /// Channel access token for the reply API.
    pub channel_token: Option<String>,

    /// API base URL, overridable for testing.
    pub api_base: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_secret: None,
            channel_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: LineConfig = serde_json::from_str(r#"{"channel_secret": "s"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.channel_secret.as_deref(), Some("s"));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
