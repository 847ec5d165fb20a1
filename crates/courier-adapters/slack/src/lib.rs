//! # Courier Slack Adapter
//!
//! Ingress and egress over the Slack real-time messaging socket.
//!
//! - [`client`]: `rtm.connect` bootstrap over the Web API
//! - [`frame`]: JSON frames read from and written to the socket
//! - [`session`]: one connected socket with its writer and keep-alive
//! - [`SlackRtmAdapter`]: the reconnecting connection manager
//!
//! ```rust,ignore
//! let adapter = SlackRtmAdapter::new(&slack, rtm, Duration::from_secs(10))?;
//! let sender = adapter.reply_sender();
//! let handle = adapter.start(dispatcher.clone());
//! // ...
//! handle.shutdown().await;
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod session;

pub use adapter::{RtmHandle, RtmReplySender, SlackRtmAdapter};
pub use client::{BotIdentity, RtmEndpoint, SlackWebClient};
pub use config::{ReconnectConfig, RtmConfig, SlackConfig};
pub use error::{RtmError, RtmResult};
pub use frame::{InboundFrame, OutboundFrame, OutboundKind};
pub use session::{ConnectionState, MessageIdSequence};
