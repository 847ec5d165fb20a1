//! Ingress platforms known to the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The messaging platform an inbound event came from.
///
/// The set is closed: adding a platform means adding a variant, an adapter
/// crate and an arm in the reply router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// LINE Messaging API, delivered through a signed webhook.
    Line,
    /// Slack real-time messaging socket.
    Slack,
}

/// How a platform interprets the reply target of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTargetKind {
    /// A short-lived token that can be used for exactly one reply call.
    SingleUseToken,
    /// A conversation identifier that can be addressed any number of times.
    Channel,
}

impl Platform {
    /// All platforms, in declaration order.
    pub const ALL: [Platform; 2] = [Platform::Line, Platform::Slack];

    /// Returns the lowercase platform name used in routes, config keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Slack => "slack",
        }
    }

    /// Returns how reply targets on this platform behave.
    pub fn reply_target_kind(&self) -> ReplyTargetKind {
        match self {
            Self::Line => ReplyTargetKind::SingleUseToken,
            Self::Slack => ReplyTargetKind::Channel,
        }
    }

    /// Maximum number of messages one reply call may carry on this platform.
    pub fn max_messages_per_reply(&self) -> usize {
        match self {
            Self::Line => 5,
            Self::Slack => 1,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
