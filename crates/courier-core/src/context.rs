//! Per-request context and the normalized inbound event.
//!
//! An adapter decodes provider payloads into [`InboundEvent`]s and turns each
//! one into a [`RequestContext`] right before handing it to the executor. The
//! context is immutable and travels explicitly through every asynchronous hop,
//! so no task-local storage is needed to correlate log lines of one request.

use std::fmt;

use crate::platform::Platform;

/// Random 64-bit identifier tying together all log lines of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Draws a fresh random id.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Wraps a known value.
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Opaque reply address: a reply token on LINE, a channel id on Slack.
///
/// Only the reply sender of the matching platform interprets the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplyTarget(String);

impl ReplyTarget {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplyTarget {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ReplyTarget {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A user-originated text message, decoded from a provider payload.
///
/// Everything that does not carry user text (presence, typing, membership,
/// stickers) is dropped by the decoders before this type is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub platform: Platform,
    pub reply_target: ReplyTarget,
    pub text: String,
}

impl InboundEvent {
    pub fn new(
        platform: Platform,
        reply_target: impl Into<ReplyTarget>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            reply_target: reply_target.into(),
            text: text.into(),
        }
    }

    /// Builds the request context for this event with a fresh correlation id.
    pub fn into_context(self) -> RequestContext {
        RequestContext::new(self.platform, self.reply_target, self.text)
    }
}

/// Immutable carrier of everything the pipeline knows about one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    platform: Platform,
    reply_target: ReplyTarget,
    text: String,
    correlation_id: CorrelationId,
}

impl RequestContext {
    /// Creates a context with a random correlation id.
    pub fn new(
        platform: Platform,
        reply_target: impl Into<ReplyTarget>,
        text: impl Into<String>,
    ) -> Self {
        Self::with_correlation_id(platform, reply_target, text, CorrelationId::random())
    }

    /// Creates a context with a caller-chosen correlation id.
    pub fn with_correlation_id(
        platform: Platform,
        reply_target: impl Into<ReplyTarget>,
        text: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            platform,
            reply_target: reply_target.into(),
            text: text.into(),
            correlation_id,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn reply_target(&self) -> &ReplyTarget {
        &self.reply_target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_is_padded_lower_hex() {
        let id = CorrelationId::from_u64(0xdead_beef);
        assert_eq!(id.to_string(), "00000000deadbeef");
        assert_eq!(CorrelationId::from_u64(u64::MAX).to_string().len(), 16);
    }

    #[test]
    fn test_inbound_event_into_context() {
        let ctx = InboundEvent::new(Platform::Line, "R", "ping").into_context();
        assert_eq!(ctx.platform(), Platform::Line);
        assert_eq!(ctx.reply_target().as_str(), "R");
        assert_eq!(ctx.text(), "ping");
    }

    #[test]
    fn test_contexts_get_distinct_correlation_ids() {
        let a = RequestContext::new(Platform::Slack, "C1", "hi");
        let b = RequestContext::new(Platform::Slack, "C1", "hi");
        // 2^-64 chance of a false failure
        assert_ne!(a.correlation_id(), b.correlation_id());
    }
}
