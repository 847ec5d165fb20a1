//! Platform-specific reply delivery.
//!
//! [`ReplyRouter`] is a `tower::Service<Reply>` that routes each reply to the
//! sender of the platform the request came from. [`egress_service`] stacks a
//! per-call timeout on top and type-erases the result, which is what the
//! [`Dispatcher`](crate::Dispatcher) calls.
//!
//! ```rust,ignore
//! let router = ReplyRouter::new()
//!     .with_sender(Platform::Line, line_client)
//!     .with_sender(Platform::Slack, rtm_sender);
//! let egress = egress_service(router, Duration::from_secs(10));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use courier_core::{EgressError, Platform, Reply, ReplySender};
use futures::future::BoxFuture;
use tower::timeout::error::Elapsed;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceBuilder};

/// The type-erased egress service used by the executor.
pub type EgressService = BoxCloneSyncService<Reply, (), EgressError>;

/// Routes a reply to the sender bound to its originating platform.
#[derive(Clone, Default)]
pub struct ReplyRouter {
    senders: HashMap<Platform, Arc<dyn ReplySender>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a sender to a platform, replacing any previous one.
    pub fn with_sender<S>(mut self, platform: Platform, sender: S) -> Self
    where
        S: ReplySender + 'static,
    {
        self.senders.insert(platform, Arc::new(sender));
        self
    }

    /// Binds an already shared sender to a platform.
    pub fn with_shared_sender(mut self, platform: Platform, sender: Arc<dyn ReplySender>) -> Self {
        self.senders.insert(platform, sender);
        self
    }

    pub fn has_sender(&self, platform: Platform) -> bool {
        self.senders.contains_key(&platform)
    }
}

impl fmt::Debug for ReplyRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyRouter")
            .field("platforms", &self.senders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Service<Reply> for ReplyRouter {
    type Response = ();
    type Error = EgressError;
    type Future = BoxFuture<'static, Result<(), EgressError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, reply: Reply) -> Self::Future {
        let platform = reply.ctx.platform();
        let sender = self.senders.get(&platform).cloned();
        Box::pin(async move {
            match sender {
                Some(sender) => sender.send(&reply).await,
                None => Err(EgressError::Unavailable(platform)),
            }
        })
    }
}

/// Wraps a router with a per-call timeout.
///
/// A call that exceeds `timeout` fails with [`EgressError::Timeout`]; the
/// in-flight provider request is dropped.
pub fn egress_service(router: ReplyRouter, timeout: Duration) -> EgressService {
    let svc = ServiceBuilder::new()
        .map_err(into_egress_error)
        .timeout(timeout)
        .service(router);
    BoxCloneSyncService::new(svc)
}

fn into_egress_error(err: BoxError) -> EgressError {
    if err.is::<Elapsed>() {
        return EgressError::Timeout;
    }
    match err.downcast::<EgressError>() {
        Ok(err) => *err,
        Err(other) => EgressError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_core::RequestContext;
    use parking_lot::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl ReplySender for Recorder {
        async fn send(&self, reply: &Reply) -> Result<(), EgressError> {
            self.seen.lock().push(reply.messages.clone());
            Ok(())
        }
    }

    struct Stuck;

    #[async_trait]
    impl ReplySender for Stuck {
        async fn send(&self, _reply: &Reply) -> Result<(), EgressError> {
            futures::future::pending().await
        }
    }

    struct Rejecting;

    #[async_trait]
    impl ReplySender for Rejecting {
        async fn send(&self, _reply: &Reply) -> Result<(), EgressError> {
            Err(EgressError::Status {
                status: 400,
                body: "Invalid reply token".into(),
            })
        }
    }

    fn reply(platform: Platform) -> Reply {
        Reply::single(Arc::new(RequestContext::new(platform, "T", "hi")), "ok")
    }

    #[tokio::test]
    async fn test_routes_by_platform() {
        let line = Arc::new(Recorder::default());
        let slack = Arc::new(Recorder::default());
        let router = ReplyRouter::new()
            .with_shared_sender(Platform::Line, line.clone())
            .with_shared_sender(Platform::Slack, slack.clone());

        router.clone().oneshot(reply(Platform::Slack)).await.unwrap();

        assert!(line.seen.lock().is_empty());
        assert_eq!(slack.seen.lock().as_slice(), [vec!["ok".to_string()]]);
    }

    #[tokio::test]
    async fn test_missing_sender_is_unavailable() {
        let svc = egress_service(ReplyRouter::new(), Duration::from_secs(1));
        let err = svc.oneshot(reply(Platform::Line)).await.unwrap_err();
        assert!(matches!(err, EgressError::Unavailable(Platform::Line)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_sender_times_out() {
        let router = ReplyRouter::new().with_sender(Platform::Line, Stuck);
        let svc = egress_service(router, Duration::from_secs(10));
        let err = svc.oneshot(reply(Platform::Line)).await.unwrap_err();
        assert!(matches!(err, EgressError::Timeout));
    }

    #[tokio::test]
    async fn test_sender_error_is_preserved() {
        let router = ReplyRouter::new().with_sender(Platform::Line, Rejecting);
        let svc = egress_service(router, Duration::from_secs(10));
        let err = svc.oneshot(reply(Platform::Line)).await.unwrap_err();
        assert!(matches!(err, EgressError::Status { status: 400, .. }));
    }
}
