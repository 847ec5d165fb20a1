//! # Courier LINE Adapter
//!
//! Webhook ingress and reply egress for the LINE Messaging API.
//!
//! - [`signature`]: `X-Line-Signature` verification over the raw body
//! - [`payload`]: decoding of the callback body into text messages
//! - [`webhook`]: the axum route `POST /api/line/v1/webhook`
//! - [`LineReplyClient`]: the reply API sender
//!
//! ```rust,ignore
//! let adapter = LineAdapter::new(config);
//! let router = adapter.router(dispatcher.clone());
//! let sender = adapter.reply_client(Duration::from_secs(10))?;
//! ```

pub mod config;
pub mod error;
pub mod payload;
pub mod reply;
pub mod signature;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use courier_core::{EventSink, TransportError, TransportResult};
use tracing::info;

pub use config::LineConfig;
pub use error::{DecodeError, SignatureError, WebhookError, WebhookResult};
pub use reply::LineReplyClient;
pub use webhook::{SIGNATURE_HEADER, WEBHOOK_PATH, WebhookState};

/// Wires the LINE webhook and reply client from configuration.
#[derive(Debug, Clone)]
pub struct LineAdapter {
    config: LineConfig,
}

impl LineAdapter {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// The webhook router, submitting decoded events to `sink`.
    pub fn router(&self, sink: Arc<dyn EventSink>) -> Router {
        info!(path = WEBHOOK_PATH, "Mounting LINE webhook");
        webhook::router(WebhookState::new(self.config.channel_secret.clone(), sink))
    }

    /// The reply sender for LINE requests.
    pub fn reply_client(&self, timeout: Duration) -> TransportResult<LineReplyClient> {
        let token = self
            .config
            .channel_token
            .as_deref()
            .ok_or_else(|| TransportError::InvalidConfig("LINE channel_token is not set".into()))?;
        LineReplyClient::new(&self.config.api_base, token, timeout)
    }
}
