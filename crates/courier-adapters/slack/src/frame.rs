//! RTM frame encoding and decoding.
//!
//! Inbound frames are JSON objects discriminated by `type`. Only `hello` and
//! user `message` frames matter; message echoes from bots, edits (anything
//! with a `subtype`) and `reply_to` acknowledgements are classified as
//! [`InboundFrame::Ignored`].

use serde::{Deserialize, Serialize};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// The provider accepted the connection.
    Hello,
    /// User text in a channel.
    Message { channel: String, text: String },
    /// The provider is about to close the socket.
    Goodbye,
    /// Acknowledgement of one of our frames.
    ReplyAck { reply_to: u64, ok: bool },
    /// Anything else, with its `type` when present.
    Ignored(Option<String>),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    reply_to: Option<u64>,
    #[serde(default)]
    ok: Option<bool>,
}

impl InboundFrame {
    /// Decodes one text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(text)?;
        Ok(raw.classify())
    }
}

impl RawFrame {
    fn classify(self) -> InboundFrame {
        if let Some(reply_to) = self.reply_to {
            return InboundFrame::ReplyAck {
                reply_to,
                ok: self.ok.unwrap_or(false),
            };
        }
        match self.kind.as_deref() {
            Some("hello") => InboundFrame::Hello,
            Some("goodbye") => InboundFrame::Goodbye,
            Some("message") if self.subtype.is_none() && self.bot_id.is_none() => {
                match (self.channel, self.text) {
                    (Some(channel), Some(text)) if !channel.is_empty() && !text.is_empty() => {
                        InboundFrame::Message { channel, text }
                    }
                    _ => InboundFrame::Ignored(Some("message".into())),
                }
            }
            _ => InboundFrame::Ignored(self.kind),
        }
    }
}

/// Body of an outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundKind {
    Ping,
    Message { channel: String, text: String },
}

/// An outbound frame with its sequence id.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub id: u64,
    #[serde(flatten)]
    pub kind: OutboundKind,
}

impl OutboundFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_decode_hello_and_goodbye() {
        assert_eq!(InboundFrame::decode(r#"{"type":"hello"}"#).unwrap(), InboundFrame::Hello);
        assert_eq!(
            InboundFrame::decode(r#"{"type":"goodbye","source":"gateway_server"}"#).unwrap(),
            InboundFrame::Goodbye
        );
    }

    #[test]
    fn test_decode_user_message() {
        let frame = InboundFrame::decode(
            r#"{"type":"message","channel":"C2147483705","user":"U2147483697","text":"Hello world","ts":"1355517523.000005"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            InboundFrame::Message {
                channel: "C2147483705".into(),
                text: "Hello world".into()
            }
        );
    }

    #[test]
    fn test_non_user_messages_are_ignored() {
        let cases = [
            r#"{"type":"message","subtype":"message_changed","channel":"C1","text":"x"}"#,
            r#"{"type":"message","bot_id":"B1","channel":"C1","text":"PONG"}"#,
            r#"{"type":"message","channel":"C1","text":""}"#,
            r#"{"type":"message","text":"no channel"}"#,
            r#"{"type":"user_typing","channel":"C1","user":"U1"}"#,
            r#"{"type":"presence_change","user":"U1","presence":"away"}"#,
        ];
        for case in cases {
            assert!(
                matches!(InboundFrame::decode(case).unwrap(), InboundFrame::Ignored(_)),
                "{case}"
            );
        }
    }

    #[test]
    fn test_reply_ack() {
        let frame = InboundFrame::decode(r#"{"ok":true,"reply_to":7,"ts":"1","text":"PONG"}"#).unwrap();
        assert_eq!(frame, InboundFrame::ReplyAck { reply_to: 7, ok: true });
    }

    #[test]
    fn test_invalid_json() {
        assert!(InboundFrame::decode("{").is_err());
    }

    #[test]
    fn test_encode_outbound() {
        let ping: Value = serde_json::from_str(
            &OutboundFrame { id: 1, kind: OutboundKind::Ping }.encode().unwrap(),
        )
        .unwrap();
        assert_eq!(ping, json!({"id": 1, "type": "ping"}));

        let msg: Value = serde_json::from_str(
            &OutboundFrame {
                id: 2,
                kind: OutboundKind::Message {
                    channel: "C1".into(),
                    text: "PONG".into(),
                },
            }
            .encode()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(msg, json!({"id": 2, "type": "message", "channel": "C1", "text": "PONG"}));
    }
}
