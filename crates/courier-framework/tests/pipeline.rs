//! End-to-end runs of the executor with the built-in handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{
    EgressError, EventSink, HandlerRegistry, Platform, Reply, ReplySender, RequestContext,
};
use courier_framework::{
    AckMode, Dispatcher, EchoHandler, PingHandler, ReplyRouter, WorkPool, egress_service,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(Platform, String, Vec<String>)>>,
}

#[async_trait]
impl ReplySender for Outbox {
    async fn send(&self, reply: &Reply) -> Result<(), EgressError> {
        self.sent.lock().push((
            reply.ctx.platform(),
            reply.ctx.reply_target().to_string(),
            reply.messages.clone(),
        ));
        Ok(())
    }
}

struct Hanging;

#[async_trait]
impl ReplySender for Hanging {
    async fn send(&self, _reply: &Reply) -> Result<(), EgressError> {
        futures::future::pending().await
    }
}

fn registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .handler(PingHandler::new().unwrap())
        .handler(EchoHandler::new().unwrap())
        .build()
}

fn gateway(ack_mode: AckMode) -> (Dispatcher, Arc<Outbox>, Arc<Outbox>) {
    let line = Arc::new(Outbox::default());
    let slack = Arc::new(Outbox::default());
    let router = ReplyRouter::new()
        .with_shared_sender(Platform::Line, line.clone())
        .with_shared_sender(Platform::Slack, slack.clone());
    let dispatcher = Dispatcher::builder()
        .registry(registry())
        .egress(egress_service(router, Duration::from_secs(10)))
        .pool(WorkPool::new(2))
        .ack_mode(ack_mode)
        .build();
    (dispatcher, line, slack)
}

#[tokio::test]
async fn ping_is_answered_on_the_originating_platform() {
    let (dispatcher, line, slack) = gateway(AckMode::FireAndReturn);

    dispatcher
        .submit(RequestContext::new(Platform::Line, "R", "ping"))
        .await
        .unwrap();
    dispatcher.shutdown().await;

    assert_eq!(
        *line.sent.lock(),
        vec![(Platform::Line, "R".to_string(), vec!["PONG".to_string()])]
    );
    assert!(slack.sent.lock().is_empty());
}

#[tokio::test]
async fn echo_reaches_the_slack_channel() {
    let (dispatcher, line, slack) = gateway(AckMode::AwaitStart);

    dispatcher
        .submit(RequestContext::new(Platform::Slack, "C024BE91L", "/echo Hello\nHello"))
        .await
        .unwrap();
    dispatcher.shutdown().await;

    assert!(line.sent.lock().is_empty());
    assert_eq!(
        *slack.sent.lock(),
        vec![(
            Platform::Slack,
            "C024BE91L".to_string(),
            vec!["Hello\nHello".to_string()]
        )]
    );
}

#[tokio::test]
async fn unmatched_text_sends_nothing() {
    let (dispatcher, line, slack) = gateway(AckMode::FireAndReturn);

    for text in ["eko Hello", "/eko Hello"] {
        dispatcher
            .submit(RequestContext::new(Platform::Line, "R", text))
            .await
            .unwrap();
        dispatcher
            .submit(RequestContext::new(Platform::Slack, "C1", text))
            .await
            .unwrap();
    }
    dispatcher.shutdown().await;

    assert!(line.sent.lock().is_empty());
    assert!(slack.sent.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn hanging_egress_is_abandoned_after_the_timeout() {
    let router = ReplyRouter::new().with_sender(Platform::Line, Hanging);
    let dispatcher = Dispatcher::builder()
        .registry(registry())
        .egress(egress_service(router, Duration::from_secs(10)))
        .pool(WorkPool::new(1))
        .build();

    let started = tokio::time::Instant::now();
    let err = dispatcher
        .process(RequestContext::new(Platform::Line, "R", "ping"))
        .await
        .unwrap_err();

    assert!(matches!(err, EgressError::Timeout));
    assert!(started.elapsed() >= Duration::from_secs(10));
}
