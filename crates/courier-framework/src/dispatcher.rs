//! The handler chain executor.
//!
//! The [`Dispatcher`] receives request contexts from the adapters through
//! [`EventSink`], runs each one on the [`WorkPool`] and, for every handler
//! whose pattern fully matches the text, streams the handler's replies to the
//! egress service.
//!
//! # Ordering
//!
//! Handlers are tried in registry order and each handler's reply stream is
//! drained before the next handler is invoked, so replies of handler N always
//! reach the provider before replies of handler N+1. Distinct events run
//! concurrently with no ordering between them.
//!
//! # Failure isolation
//!
//! A handler that yields an error or panics is logged with the request's
//! correlation id and skipped. Replies it produced before failing are kept.
//! Only egress failures end an event early.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder()
//!     .registry(registry)
//!     .egress(egress_service(router, Duration::from_secs(10)))
//!     .pool(WorkPool::new(8))
//!     .build();
//!
//! dispatcher.submit(ctx).await?;
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use courier_core::{
    EgressError, EventSink, HandlerError, HandlerRegistry, HandlerSpec, Reply, ReplyTargetKind,
    RequestContext, SubmitError, async_trait, fail,
};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::egress::{EgressService, ReplyRouter, egress_service};
use crate::pool::WorkPool;

/// When [`EventSink::submit`] returns relative to the event's dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    /// Queue the event and return at once; a full queue rejects it.
    #[default]
    FireAndReturn,
    /// Wait for room in the pool queue before returning.
    AwaitStart,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Runs inbound requests through the handler chain and delivers the replies.
///
/// Cloning is cheap; clones share the registry, the egress service and the
/// pool.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
    ack_mode: AckMode,
}

struct Inner {
    registry: HandlerRegistry,
    egress: EgressService,
    pool: WorkPool,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    pub fn pool(&self) -> &WorkPool {
        &self.inner.pool
    }

    pub fn ack_mode(&self) -> AckMode {
        self.ack_mode
    }

    /// A view of this dispatcher submitting with another [`AckMode`].
    ///
    /// The view shares the registry, the egress service and the pool.
    pub fn with_ack_mode(&self, ack_mode: AckMode) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ack_mode,
        }
    }

    /// The lazy reply stream for one request.
    ///
    /// A handler is only invoked once the replies of the previous handler
    /// have been consumed. Empty replies are filtered out.
    pub fn replies(&self, ctx: Arc<RequestContext>) -> BoxStream<'static, String> {
        let specs = self.inner.registry.handlers().to_vec();
        stream::iter(specs)
            .flat_map(move |spec| handler_replies(&spec, Arc::clone(&ctx)))
            .filter(|reply| future::ready(!reply.is_empty()))
            .boxed()
    }

    /// Runs one request to completion and returns the number of messages
    /// delivered.
    ///
    /// On a single-use reply target all replies go out in one call, truncated
    /// to the platform limit. On a reusable target each reply is one call,
    /// issued as soon as the handler yields it. The first egress failure
    /// stops the request.
    pub async fn process(&self, ctx: RequestContext) -> Result<usize, EgressError> {
        let ctx = Arc::new(ctx);
        let platform = ctx.platform();
        let mut replies = self.replies(Arc::clone(&ctx));

        match platform.reply_target_kind() {
            ReplyTargetKind::Channel => {
                let mut sent = 0;
                while let Some(message) = replies.next().await {
                    self.deliver(Reply::single(Arc::clone(&ctx), message))
                        .await?;
                    sent += 1;
                }
                Ok(sent)
            }
            ReplyTargetKind::SingleUseToken => {
                let mut batch: Vec<String> = replies.collect().await;
                if batch.is_empty() {
                    return Ok(0);
                }
                let max = platform.max_messages_per_reply();
                if batch.len() > max {
                    warn!(
                        platform = %platform,
                        produced = batch.len(),
                        dropped = batch.len() - max,
                        "Too many replies for a single-use reply target, dropping the surplus"
                    );
                    batch.truncate(max);
                }
                let sent = batch.len();
                self.deliver(Reply::new(ctx, batch)).await?;
                Ok(sent)
            }
        }
    }

    async fn deliver(&self, reply: Reply) -> Result<(), EgressError> {
        debug!(messages = reply.messages.len(), "Sending reply");
        self.inner.egress.clone().oneshot(reply).await
    }

    /// Event task body: process and log the outcome.
    async fn run(self, ctx: RequestContext) {
        info!(text = %ctx.text(), "Request received");
        match self.process(ctx).await {
            Ok(count) => info!(replies = count, "Replied"),
            Err(e) => error!(error = %e, "Failed to deliver reply, dropping remaining replies"),
        }
    }

    /// Stops accepting events and waits for the running ones.
    pub async fn shutdown(&self) {
        self.inner.pool.shutdown().await;
    }
}

#[async_trait]
impl EventSink for Dispatcher {
    async fn submit(&self, ctx: RequestContext) -> Result<(), SubmitError> {
        let span = info_span!(
            "request",
            correlation_id = %ctx.correlation_id(),
            platform = %ctx.platform(),
        );
        let work = self.clone().run(ctx).instrument(span);
        match self.ack_mode {
            AckMode::FireAndReturn => self.inner.pool.submit(work),
            AckMode::AwaitStart => self.inner.pool.submit_started(work).await,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.inner.registry.len())
            .field("workers", &self.inner.pool.workers())
            .field("ack_mode", &self.ack_mode)
            .finish()
    }
}

// =============================================================================
// Per-handler stream
// =============================================================================

/// Replies of one handler, or nothing when its pattern does not match.
///
/// The stream ends at the handler's first error or panic.
fn handler_replies(spec: &HandlerSpec, ctx: Arc<RequestContext>) -> BoxStream<'static, String> {
    let Some(groups) = spec.matches(ctx.text()) else {
        return stream::empty().boxed();
    };

    let handler = spec.handler();
    let replies = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&ctx, groups)))
    {
        Ok(replies) => AssertUnwindSafe(replies)
            .catch_unwind()
            .map(|item| item.unwrap_or_else(|panic| Err(panicked(panic))))
            .boxed(),
        Err(panic) => fail(panicked(panic)),
    };

    let name = spec.name().to_string();
    let correlation_id = ctx.correlation_id();
    replies
        .scan((), move |_, item| {
            future::ready(match item {
                Ok(reply) => Some(reply),
                Err(e) => {
                    warn!(
                        correlation_id = %correlation_id,
                        handler = %name,
                        error = %e,
                        "Handler failed, skipping"
                    );
                    None
                }
            })
        })
        .boxed()
}

fn panicked(payload: Box<dyn Any + Send>) -> HandlerError {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    HandlerError::Panicked(msg)
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    registry: Option<HandlerRegistry>,
    egress: Option<EgressService>,
    pool: Option<WorkPool>,
    ack_mode: AckMode,
}

impl DispatcherBuilder {
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn egress(mut self, egress: EgressService) -> Self {
        self.egress = Some(egress);
        self
    }

    pub fn pool(mut self, pool: WorkPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn ack_mode(mut self, ack_mode: AckMode) -> Self {
        self.ack_mode = ack_mode;
        self
    }

    /// Builds the dispatcher.
    ///
    /// Missing parts default to an empty registry, a router without senders
    /// (every reply fails as unavailable) with a 10 s timeout, and a pool of
    /// one worker per available CPU.
    pub fn build(self) -> Dispatcher {
        let egress = self.egress.unwrap_or_else(|| {
            egress_service(ReplyRouter::new(), std::time::Duration::from_secs(10))
        });
        let pool = self.pool.unwrap_or_else(|| {
            WorkPool::new(
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            )
        });
        Dispatcher {
            inner: Arc::new(Inner {
                registry: self.registry.unwrap_or_default(),
                egress,
                pool,
            }),
            ack_mode: self.ack_mode,
        }
    }
}
