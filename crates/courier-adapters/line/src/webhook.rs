//! The LINE webhook endpoint.
//!
//! ```text
//! POST /api/line/v1/webhook
//!   no X-Line-Signature  -> 200 "" (probe, nothing runs)
//!   bad signature        -> 400
//!   malformed body       -> 400
//!   otherwise            -> submit each text message, then 200 ""
//! ```
//!
//! Replies are not awaited; they reach the user through the reply API once
//! the executor gets to them.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use courier_core::EventSink;
use tracing::{debug, warn};

use crate::error::WebhookResult;
use crate::{payload, signature};

/// Route the webhook is mounted on.
pub const WEBHOOK_PATH: &str = "/api/line/v1/webhook";

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Shared state of the webhook route.
pub struct WebhookState {
    channel_secret: Option<String>,
    sink: Arc<dyn EventSink>,
}

impl WebhookState {
    pub fn new(channel_secret: Option<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            channel_secret,
            sink,
        }
    }
}

/// Builds the router serving [`WEBHOOK_PATH`].
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(on_webhook))
        .with_state(Arc::new(state))
}

async fn on_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResult<&'static str> {
    let Some(header) = headers.get(SIGNATURE_HEADER) else {
        warn!("No X-Line-Signature");
        return Ok("");
    };
    let provided = header.to_str().ok();
    debug!(signature = ?provided, payload_len = body.len(), "Received LINE webhook");

    signature::check(&body, provided, state.channel_secret.as_deref())?;
    let events = payload::decode(&body)?;

    for event in events {
        state.sink.submit(event.into_context()).await?;
    }
    Ok("")
}
