//! # Courier Core
//!
//! Shared vocabulary of the Courier chat-bot gateway.
//!
//! Courier receives user text messages from several messaging platforms,
//! runs them through an ordered chain of pattern-matched handlers and sends
//! each reply back through the platform the message came from.
//!
//! This crate holds the types every other crate agrees on:
//!
//! - **Requests**: [`InboundEvent`], [`RequestContext`], [`CorrelationId`]
//! - **Handlers**: [`Handler`], [`Pattern`], [`MatchGroups`], [`ReplyStream`]
//! - **Registry**: [`HandlerRegistry`], frozen at startup
//! - **Seams**: [`EventSink`] (adapter → executor) and [`ReplySender`]
//!   (executor → platform)
//!
//! ```text
//! ┌─────────────┐     ┌───────────┐     ┌──────────┐     ┌─────────────┐
//! │   Adapter   │────▶│ EventSink │────▶│ Handlers │────▶│ ReplySender │
//! │ LINE, Slack │     │ executor  │     │  chain   │     │ same origin │
//! └─────────────┘     └───────────┘     └──────────┘     └─────────────┘
//! ```

pub mod context;
pub mod error;
pub mod handler;
pub mod platform;
pub mod registry;
pub mod reply;

pub use context::{CorrelationId, InboundEvent, ReplyTarget, RequestContext};
pub use error::{
    EgressError, EgressResult, HandlerError, SubmitError, TransportError, TransportResult,
};
pub use handler::{
    BoxedHandler, Handler, HandlerSpec, MatchGroups, Pattern, ReplyStream, fail, no_replies,
    replies,
};
pub use platform::{Platform, ReplyTargetKind};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use reply::{EventSink, Reply, ReplySender};

// Re-exported for handler authors.
pub use async_trait::async_trait;
pub use futures::stream::BoxStream;
