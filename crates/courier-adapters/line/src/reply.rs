//! Replies through the LINE reply API.

use std::time::Duration;

use courier_core::{EgressError, Reply, ReplySender, TransportError, async_trait};
use courier_transport::HttpClient;
use serde::Serialize;
use tracing::{debug, warn};

/// Path of the reply endpoint below the API base.
pub const REPLY_PATH: &str = "/v2/bot/message/reply";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Sends replies with a reply token and the channel access token.
///
/// A reply token is single-use, so every message of a [`Reply`] goes out in
/// one call. Failed calls are never retried.
#[derive(Debug, Clone)]
pub struct LineReplyClient {
    http: HttpClient,
    endpoint: String,
    channel_token: String,
}

impl LineReplyClient {
    pub fn new(
        api_base: &str,
        channel_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            endpoint: format!("{}{}", api_base.trim_end_matches('/'), REPLY_PATH),
            channel_token: channel_token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplySender for LineReplyClient {
    async fn send(&self, reply: &Reply) -> Result<(), EgressError> {
        let request = ReplyRequest {
            reply_token: reply.ctx.reply_target().as_str(),
            messages: reply
                .messages
                .iter()
                .map(|text| TextMessage { kind: "text", text })
                .collect(),
        };

        let resp = self
            .http
            .post_json(&self.endpoint, &self.channel_token, &request)
            .await?;

        if !resp.is_success() {
            warn!(status = resp.status, body = %resp.body, "LINE rejected reply");
            return Err(EgressError::Status {
                status: resp.status,
                body: resp.body,
            });
        }
        debug!(messages = reply.messages.len(), "LINE reply accepted");
        Ok(())
    }
}
