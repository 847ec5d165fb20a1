//! # Courier
//!
//! A chat-bot gateway: inbound text from a LINE webhook or a Slack RTM
//! socket runs through one ordered chain of pattern handlers, and every
//! reply goes back to the conversation it came from.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                     ┌────────────┐     ┌────────────┐
//! │ LINE webhook │──┐                  │  handler 1 │     │ LINE reply │
//! └──────────────┘  ├──▶ Dispatcher ──▶│  handler 2 │──▶──┤ API        │
//! ┌──────────────┐  │    (work pool)   │  ...       │     ├────────────┤
//! │ Slack RTM    │──┘                  └────────────┘     │ Slack RTM  │
//! └──────────────┘                                        └────────────┘
//! ```
//!
//! - **Adapters** verify and decode provider traffic into requests
//! - **Dispatcher** runs every matching handler in registration order
//! - **Handlers** are `(pattern, function)` pairs yielding a lazy stream of replies
//! - **Reply router** delivers each reply through the sender of the origin platform
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let shout = handler_fn(r"(?i)shout\s+(.+)", |_ctx, groups| {
//!         replies([groups.get(1).unwrap_or_default().to_uppercase()])
//!     })?;
//!
//!     CourierRuntime::builder()
//!         .handler(PingHandler::new()?)
//!         .handler(shout)
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use courier_adapter_line as line;
pub use courier_adapter_slack as slack;
pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;
pub use courier_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use courier_runtime::{CourierConfig, CourierRuntime};

    // Handler authoring
    pub use courier_core::{
        Handler, HandlerError, MatchGroups, Pattern, Platform, ReplyStream, RequestContext,
        fail, no_replies, replies,
    };
    pub use courier_framework::{EchoHandler, PingHandler, handler_fn};

    // Logging macros
    pub use courier_runtime::prelude::*;
}
