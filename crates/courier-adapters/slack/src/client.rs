//! Slack Web API calls needed by the RTM adapter.

use std::time::Duration;

use courier_transport::HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RtmError, RtmResult};

#[derive(Debug, Deserialize)]
struct RtmConnectResponse {
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "self")]
    bot: Option<BotIdentity>,
}

/// The bot user the token belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Result of a successful `rtm.connect`.
#[derive(Debug, Clone)]
pub struct RtmEndpoint {
    pub url: String,
    pub bot: Option<BotIdentity>,
}

/// Minimal Slack Web API client.
#[derive(Debug, Clone)]
pub struct SlackWebClient {
    http: HttpClient,
    api_base: String,
    bot_token: String,
}

impl SlackWebClient {
    pub fn new(api_base: &str, bot_token: impl Into<String>, timeout: Duration) -> RtmResult<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// Calls `rtm.connect` and returns the socket URL.
    pub async fn rtm_connect(&self) -> RtmResult<RtmEndpoint> {
        let url = format!("{}/rtm.connect", self.api_base);
        let resp = self.http.post_empty(&url, &self.bot_token).await?;
        if !resp.is_success() {
            return Err(RtmError::Bootstrap(format!("HTTP {}", resp.status)));
        }

        let body: RtmConnectResponse = resp.json()?;
        if !body.ok {
            return Err(RtmError::Bootstrap(
                body.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        let url = body
            .url
            .ok_or_else(|| RtmError::Bootstrap("no url in rtm.connect response".into()))?;
        debug!(bot = ?body.bot.as_ref().map(|b| &b.id), "rtm.connect succeeded");
        Ok(RtmEndpoint { url, bot: body.bot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use courier_transport::{HttpServer, ListenerHandle};

    async fn fake_slack(reply: &'static str) -> ListenerHandle {
        let app = Router::new().route(
            "/api/rtm.connect",
            post(move |headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer xoxb-test");
                if authorized {
                    reply
                } else {
                    r#"{"ok":false,"error":"not_authed"}"#
                }
            }),
        );
        HttpServer::serve("127.0.0.1:0", app).await.unwrap()
    }

    fn client(server: &ListenerHandle, token: &str) -> SlackWebClient {
        let base = format!("http://{}/api", server.local_addr());
        SlackWebClient::new(&base, token, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_rtm_connect_ok() {
        let server = fake_slack(
            r#"{"ok":true,"url":"wss://example.invalid/websocket/abc","team":{"id":"T1"},"self":{"id":"U0BOT","name":"courier"}}"#,
        )
        .await;

        let endpoint = client(&server, "xoxb-test").rtm_connect().await.unwrap();
        assert_eq!(endpoint.url, "wss://example.invalid/websocket/abc");
        assert_eq!(endpoint.bot.unwrap().id, "U0BOT");
    }

    #[tokio::test]
    async fn test_rtm_connect_error() {
        let server = fake_slack(r#"{"ok":true,"url":"wss://x"}"#).await;

        let err = client(&server, "wrong").rtm_connect().await.unwrap_err();
        match err {
            RtmError::Bootstrap(reason) => assert_eq!(reason, "not_authed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
