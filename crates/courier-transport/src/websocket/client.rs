//! WebSocket client connector.

use courier_core::{TransportError, TransportResult};
use futures::StreamExt;
use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::info;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsSink = SplitSink<WsStream, Message>;
pub type WsSource = SplitStream<WsStream>;

/// Opens a socket and splits it into its write and read halves.
pub async fn connect(url: &str) -> TransportResult<(WsSink, WsSource)> {
    info!(url = %redact(url), "Connecting to WebSocket server");
    let (stream, _response) =
        connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: redact(url).to_string(),
                reason: format!("WebSocket connection failed: {e}"),
            })?;
    Ok(stream.split())
}

/// A close message with the given code.
pub fn close_frame(code: CloseCode, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }))
}

/// Strips the query string, which carries session tickets on some providers.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("wss://example.com/websocket/abc?ticket=secret"),
            "wss://example.com/websocket/abc"
        );
        assert_eq!(redact("ws://localhost:9000"), "ws://localhost:9000");
    }

    #[test]
    fn test_close_frame() {
        match close_frame(CloseCode::Normal, "bye") {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CloseCode::Normal);
                assert_eq!(frame.reason.as_str(), "bye");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let err = connect("ws://127.0.0.1:1/socket").await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}
