//! Seams between adapters, the executor and the reply senders.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::{EgressError, SubmitError};

/// One outbound reply call.
///
/// Channel platforms carry exactly one message per call; single-use token
/// platforms carry every reply of the request in one batch.
#[derive(Debug, Clone)]
pub struct Reply {
    pub ctx: Arc<RequestContext>,
    pub messages: Vec<String>,
}

impl Reply {
    pub fn new(ctx: Arc<RequestContext>, messages: Vec<String>) -> Self {
        Self { ctx, messages }
    }

    /// A reply carrying a single message.
    pub fn single(ctx: Arc<RequestContext>, message: impl Into<String>) -> Self {
        Self::new(ctx, vec![message.into()])
    }
}

/// Delivers replies to one platform.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Sends the reply and resolves once the provider accepted it.
    async fn send(&self, reply: &Reply) -> Result<(), EgressError>;
}

/// Accepts decoded events for asynchronous processing.
///
/// Implemented by the executor; adapters only see this trait.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Hands one request over; returns once the event is accepted (or started,
    /// depending on the acknowledgement mode), never after the replies.
    async fn submit(&self, ctx: RequestContext) -> Result<(), SubmitError>;
}

#[async_trait]
impl<T: ReplySender + ?Sized> ReplySender for Arc<T> {
    async fn send(&self, reply: &Reply) -> Result<(), EgressError> {
        (**self).send(reply).await
    }
}

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn submit(&self, ctx: RequestContext) -> Result<(), SubmitError> {
        (**self).submit(ctx).await
    }
}
