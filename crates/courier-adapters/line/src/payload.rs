//! LINE webhook payload decoding.
//!
//! Only `message` events with `text` content carry user text; every other
//! event type (follow, join, postback, ...) and every other content type
//! (sticker, image, location, ...) is dropped here.

use courier_core::{InboundEvent, Platform};
use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;

/// The webhook request body.
///
/// `events` is required; a body without it, or with `null`, is invalid.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message(MessageEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Absent on redelivered events, which cannot be replied to.
    #[serde(default)]
    pub reply_token: Option<String>,
    pub message: MessageContent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Decodes a raw webhook body into the text messages it carries.
pub fn decode(body: &[u8]) -> Result<Vec<InboundEvent>, DecodeError> {
    let request: CallbackRequest = serde_json::from_slice(body)?;
    Ok(request.into_events())
}

impl CallbackRequest {
    /// The user text messages in this request, in delivery order.
    pub fn into_events(self) -> Vec<InboundEvent> {
        self.events
            .into_iter()
            .filter_map(|event| match event {
                WebhookEvent::Message(MessageEvent {
                    reply_token: Some(token),
                    message: MessageContent::Text { text },
                }) => Some(InboundEvent::new(Platform::Line, token, text)),
                WebhookEvent::Message(MessageEvent {
                    reply_token: None, ..
                }) => {
                    debug!("Skipping LINE message without reply token");
                    None
                }
                _ => None,
            })
            .collect()
    }
}
