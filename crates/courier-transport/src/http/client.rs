//! HTTP client for provider Web APIs.

use std::time::Duration;

use courier_core::{TransportError, TransportResult};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

/// Thin wrapper around a shared [`reqwest::Client`].
///
/// Network failures are [`TransportError`]s; non-success statuses are
/// returned as a normal [`HttpResponse`] so callers can map them to their
/// own error types.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with a total per-request timeout.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// POSTs a JSON body with bearer authentication.
    pub async fn post_json<T>(&self, url: &str, token: &str, body: &T) -> TransportResult<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        HttpResponse::read(url, resp).await
    }

    /// POSTs an empty form with bearer authentication.
    pub async fn post_empty(&self, url: &str, token: &str) -> TransportResult<HttpResponse> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        HttpResponse::read(url, resp).await
    }
}

fn request_error(url: &str, err: reqwest::Error) -> TransportError {
    TransportError::ConnectionFailed {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    async fn read(url: &str, resp: reqwest::Response) -> TransportResult<Self> {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        trace!(url = %url, status, len = body.len(), "HTTP response");
        Ok(Self { status, body })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> TransportResult<T> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Io(format!("invalid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let resp = HttpResponse {
            status: 200,
            body: r#"{"ok":true}"#.into(),
        };
        assert!(resp.is_success());
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["ok"], true);

        let resp = HttpResponse {
            status: 400,
            body: "nope".into(),
        };
        assert!(!resp.is_success());
        assert!(resp.json::<serde_json::Value>().is_err());
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
