//! One RTM socket session.
//!
//! A session owns exactly one reader loop (this function's caller task) and
//! one writer task. The writer owns the socket sink and drains a bounded
//! queue of [`WriterCommand`]s, so application replies and keep-alive pings
//! never interleave mid-frame. Frame ids are drawn from the adapter's
//! [`MessageIdSequence`] at write time, which keeps them strictly increasing
//! on the wire.
//!
//! ```text
//!            hello                     hello (again)
//! HANDSHAKING ────▶ LIVE ──┬── keep-alive restarted, never duplicated
//!                          ├── close / read error / write error ──▶ FAILED
//!                          └── shutdown ──▶ CLOSING (NORMAL close sent)
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use courier_core::{EventSink, Platform, RequestContext};
use courier_transport::websocket::{CloseCode, Message, close_frame};
use futures::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{RtmError, RtmResult};
use crate::frame::{InboundFrame, OutboundFrame, OutboundKind};

/// Delay between entering LIVE and the first keep-alive ping.
pub const KEEPALIVE_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the writer queue.
const WRITER_QUEUE: usize = 64;

// =============================================================================
// Connection state
// =============================================================================

/// Observable state of the RTM connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Handshaking,
    Live,
    Closing,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Live => "live",
            Self::Closing => "closing",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Message ids
// =============================================================================

/// Monotonic 64-bit frame id generator shared by pings and replies.
///
/// Owned by one adapter and never reset, including across reconnects.
#[derive(Debug, Default)]
pub struct MessageIdSequence(AtomicU64);

impl MessageIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id; the first one is `1`.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The last id handed out, `0` if none.
    pub fn last(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Writer
// =============================================================================

/// A request to the writer task.
#[derive(Debug)]
pub enum WriterCommand {
    /// Write a frame; the assigned id or the failure is reported on `done`.
    Frame {
        kind: OutboundKind,
        done: oneshot::Sender<RtmResult<u64>>,
    },
    /// Write a control message (pong) without an id.
    Control(Message),
    /// Write a close frame and stop.
    Close(CloseCode),
}

/// Cloneable handle to a session's writer task.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterCommand>,
}

impl WriterHandle {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WriterCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queues a frame and waits until it was written, returning its id.
    pub async fn send(&self, kind: OutboundKind) -> RtmResult<u64> {
        let (done, written) = oneshot::channel();
        self.tx
            .send(WriterCommand::Frame { kind, done })
            .await
            .map_err(|_| RtmError::WriterClosed)?;
        written.await.map_err(|_| RtmError::WriterClosed)?
    }

    async fn control(&self, message: Message) -> RtmResult<()> {
        self.tx
            .send(WriterCommand::Control(message))
            .await
            .map_err(|_| RtmError::WriterClosed)
    }

    async fn close(&self, code: CloseCode) -> RtmResult<()> {
        self.tx
            .send(WriterCommand::Close(code))
            .await
            .map_err(|_| RtmError::WriterClosed)
    }
}

/// The writer of the live session, if any, shared with the reply sender.
#[derive(Debug, Default)]
pub struct WriterSlot(Mutex<Option<WriterHandle>>);

impl WriterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<WriterHandle> {
        self.0.lock().clone()
    }

    fn set(&self, writer: WriterHandle) {
        *self.0.lock() = Some(writer);
    }

    fn clear(&self) {
        self.0.lock().take();
    }
}

/// Writer task body: owns the sink until a close command, a write error or
/// every handle is dropped.
pub async fn run_writer<S>(
    mut sink: S,
    mut commands: mpsc::Receiver<WriterCommand>,
    ids: Arc<MessageIdSequence>,
) -> RtmResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(command) = commands.recv().await {
        match command {
            WriterCommand::Frame { kind, done } => {
                let frame = OutboundFrame {
                    id: ids.next(),
                    kind,
                };
                let json = match frame.encode() {
                    Ok(json) => json,
                    Err(e) => {
                        let _ = done.send(Err(RtmError::Encode(e.to_string())));
                        continue;
                    }
                };
                match sink.send(Message::Text(json.into())).await {
                    Ok(()) => {
                        trace!(id = frame.id, "Frame written");
                        let _ = done.send(Ok(frame.id));
                    }
                    Err(e) => {
                        let err = RtmError::ConnectionLost(format!("write failed: {e}"));
                        let _ = done.send(Err(err.clone()));
                        return Err(err);
                    }
                }
            }
            WriterCommand::Control(message) => {
                sink.send(message)
                    .await
                    .map_err(|e| RtmError::ConnectionLost(format!("write failed: {e}")))?;
            }
            WriterCommand::Close(code) => {
                if let Err(e) = sink.send(close_frame(code, "")).await {
                    debug!(error = %e, "Failed to send close frame");
                }
                let _ = sink.close().await;
                return Ok(());
            }
        }
    }
    let _ = sink.close().await;
    Ok(())
}

// =============================================================================
// Keep-alive
// =============================================================================

/// Starts the periodic ping task for a LIVE session.
///
/// The first ping goes out after [`KEEPALIVE_INITIAL_DELAY`], then every
/// `period`. The task ends when the writer is gone.
pub fn spawn_keepalive(writer: WriterHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + KEEPALIVE_INITIAL_DELAY, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match writer.send(OutboundKind::Ping).await {
                Ok(id) => trace!(id, "Ping sent"),
                Err(RtmError::WriterClosed) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to ping Slack");
                    break;
                }
            }
        }
    })
}

// =============================================================================
// Session
// =============================================================================

/// Everything a session shares with its adapter.
pub struct SessionContext {
    pub ids: Arc<MessageIdSequence>,
    pub writer_slot: Arc<WriterSlot>,
    pub events: Arc<dyn EventSink>,
    pub state: watch::Sender<ConnectionState>,
    pub ping_interval: Duration,
    pub shutdown: CancellationToken,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Local shutdown; a NORMAL close was sent.
    Shutdown,
    /// The provider closed the socket.
    Closed(Option<CloseCode>),
    /// Read or write failure.
    Lost(String),
}

/// Outcome of [`run_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    /// Whether the session ever became LIVE.
    pub reached_live: bool,
}

/// Drives one connected socket until it ends.
pub async fn run_session<Si, St, E>(sink: Si, mut stream: St, ctx: &SessionContext) -> SessionOutcome
where
    Si: Sink<Message> + Unpin + Send + 'static,
    Si::Error: fmt::Display,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    ctx.state.send_replace(ConnectionState::Handshaking);

    let (writer, commands) = WriterHandle::channel(WRITER_QUEUE);
    let mut writer_task = tokio::spawn(run_writer(sink, commands, Arc::clone(&ctx.ids)));
    let mut keepalive: Option<JoinHandle<()>> = None;
    let mut live = false;

    let end = loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                ctx.state.send_replace(ConnectionState::Closing);
                break SessionEnd::Shutdown;
            }
            result = &mut writer_task => {
                let reason = match result {
                    Ok(Err(e)) => e.to_string(),
                    Ok(Ok(())) => "writer stopped".to_string(),
                    Err(e) => format!("writer task failed: {e}"),
                };
                break SessionEnd::Lost(reason);
            }
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match InboundFrame::decode(&text) {
                        Ok(InboundFrame::Hello) => {
                            if !live {
                                live = true;
                                ctx.state.send_replace(ConnectionState::Live);
                                info!("RTM session is live");
                            } else {
                                debug!("Repeated hello, restarting keep-alive");
                            }
                            if let Some(previous) = keepalive.take() {
                                previous.abort();
                            }
                            keepalive = Some(spawn_keepalive(writer.clone(), ctx.ping_interval));
                            ctx.writer_slot.set(writer.clone());
                        }
                        Ok(InboundFrame::Message { channel, text }) if live => {
                            let request = RequestContext::new(Platform::Slack, channel, text);
                            debug!(
                                correlation_id = %request.correlation_id(),
                                channel = %request.reply_target(),
                                "Received Slack message"
                            );
                            if let Err(e) = ctx.events.submit(request).await {
                                warn!(error = %e, "Failed to submit Slack message");
                            }
                        }
                        Ok(InboundFrame::Goodbye) => info!("Slack announced disconnect"),
                        Ok(InboundFrame::ReplyAck { reply_to, ok }) => {
                            trace!(reply_to, ok, "Frame acknowledged");
                        }
                        Ok(frame) => trace!(?frame, "Ignoring frame"),
                        Err(e) => debug!(error = %e, "Ignoring undecodable frame"),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    trace!("Received ping, sending pong");
                    let _ = writer.control(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.as_ref().map(|f| f.code);
                    match &frame {
                        Some(f) if f.code == CloseCode::Normal => {
                            info!(code = %f.code, reason = f.reason.as_str(), "Slack closed the connection");
                        }
                        Some(f) => {
                            error!(code = %f.code, reason = f.reason.as_str(), "Slack closed the connection");
                        }
                        None => error!("Slack closed the connection without a status"),
                    }
                    break SessionEnd::Closed(code);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "RTM read error");
                    break SessionEnd::Lost(e.to_string());
                }
                None => break SessionEnd::Lost("stream ended".to_string()),
            }
        }
    };

    ctx.writer_slot.clear();

    if end == SessionEnd::Shutdown {
        if writer.close(CloseCode::Normal).await.is_ok() {
            let _ = writer_task.await;
        }
    } else {
        ctx.state.send_replace(ConnectionState::Failed);
        writer_task.abort();
    }

    if let Some(keepalive) = keepalive.take() {
        keepalive.abort();
    }

    SessionOutcome {
        end,
        reached_live: live,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{SubmitError, async_trait};
    use futures::channel::mpsc as fmpsc;
    use serde_json::Value;
    use tokio::time::timeout;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<RequestContext>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn submit(&self, ctx: RequestContext) -> Result<(), SubmitError> {
            self.seen.lock().push(ctx);
            Ok(())
        }
    }

    struct Harness {
        inbound: fmpsc::UnboundedSender<Result<Message, String>>,
        outbound: fmpsc::UnboundedReceiver<Message>,
        events: Arc<RecordingSink>,
        slot: Arc<WriterSlot>,
        ids: Arc<MessageIdSequence>,
        state: watch::Receiver<ConnectionState>,
        shutdown: CancellationToken,
        task: JoinHandle<SessionOutcome>,
    }

    impl Harness {
        fn start() -> Self {
            let (inbound, stream) = fmpsc::unbounded();
            let (sink, outbound) = fmpsc::unbounded();
            let events = Arc::new(RecordingSink::default());
            let slot = Arc::new(WriterSlot::new());
            let ids = Arc::new(MessageIdSequence::new());
            let (state_tx, state) = watch::channel(ConnectionState::Connecting);
            let shutdown = CancellationToken::new();
            let ctx = SessionContext {
                ids: ids.clone(),
                writer_slot: slot.clone(),
                events: events.clone(),
                state: state_tx,
                ping_interval: Duration::from_secs(30),
                shutdown: shutdown.clone(),
            };
            let task = tokio::spawn(async move { run_session(sink, stream, &ctx).await });
            Self {
                inbound,
                outbound,
                events,
                slot,
                ids,
                state,
                shutdown,
                task,
            }
        }

        fn push(&self, json: &str) {
            self.inbound
                .unbounded_send(Ok(Message::Text(json.to_string().into())))
                .unwrap();
        }

        async fn next_frame(&mut self) -> Value {
            match self.outbound.next().await {
                Some(Message::Text(text)) => serde_json::from_str(&text).unwrap(),
                other => panic!("unexpected outbound message: {other:?}"),
            }
        }

        async fn settle(&self) {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[test]
    fn test_id_sequence_is_monotonic() {
        let ids = MessageIdSequence::new();
        assert_eq!(ids.last(), 0);
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
        assert_eq!(ids.last(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_starts_keepalive() {
        let mut h = Harness::start();
        h.settle().await;
        assert_eq!(*h.state.borrow(), ConnectionState::Handshaking);

        let hello_at = Instant::now();
        h.push(r#"{"type":"hello"}"#);

        let first = h.next_frame().await;
        assert_eq!(first["type"], "ping");
        assert_eq!(first["id"], 1);
        let elapsed = hello_at.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
        assert_eq!(*h.state.borrow(), ConnectionState::Live);

        let second = h.next_frame().await;
        assert_eq!(second["type"], "ping");
        assert_eq!(second["id"], 2);
        assert!(hello_at.elapsed() <= Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_hello_does_not_duplicate_keepalive() {
        let mut h = Harness::start();
        h.push(r#"{"type":"hello"}"#);
        assert_eq!(h.next_frame().await["id"], 1);

        // a reply goes through the same sequence
        let writer = h.slot.get().unwrap();
        let id = writer
            .send(OutboundKind::Message {
                channel: "C1".into(),
                text: "PONG".into(),
            })
            .await
            .unwrap();
        assert_eq!(id, 2);
        let reply = h.next_frame().await;
        assert_eq!(reply["type"], "message");
        assert_eq!(reply["channel"], "C1");
        assert_eq!(reply["id"], 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let rehello_at = Instant::now();
        h.push(r#"{"type":"hello"}"#);
        h.settle().await;

        // one minute after the second hello: pings at +1s, +31s and +61s only
        let deadline = rehello_at + Duration::from_secs(62);
        let mut pings = Vec::new();
        while let Ok(frame) = tokio::time::timeout_at(deadline, h.next_frame()).await {
            pings.push((frame["id"].as_u64().unwrap(), rehello_at.elapsed().as_secs()));
        }
        assert_eq!(pings, [(3, 1), (4, 31), (5, 61)]);
        assert_eq!(h.ids.last(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_are_submitted_only_when_live() {
        let h = Harness::start();
        h.push(r#"{"type":"message","channel":"C1","text":"too early"}"#);
        h.settle().await;
        assert!(h.events.seen.lock().is_empty());

        h.push(r#"{"type":"hello"}"#);
        h.push(r#"{"type":"user_typing","channel":"C1"}"#);
        h.push(r#"{"type":"message","subtype":"bot_message","channel":"C1","text":"PONG"}"#);
        h.push(r#"{"type":"message","channel":"C024BE91L","user":"U1","text":"ping"}"#);
        h.settle().await;

        let seen = h.events.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].platform(), Platform::Slack);
        assert_eq!(seen[0].reply_target().as_str(), "C024BE91L");
        assert_eq!(seen[0].text(), "ping");
    }

    #[tokio::test(start_paused = true)]
    async fn test_socket_ping_is_answered() {
        let mut h = Harness::start();
        h.inbound
            .unbounded_send(Ok(Message::Ping(vec![1, 2, 3].into())))
            .unwrap();
        match h.outbound.next().await {
            Some(Message::Pong(data)) => assert_eq!(&data[..], &[1u8, 2, 3]),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_sends_normal_close() {
        let mut h = Harness::start();
        h.push(r#"{"type":"hello"}"#);
        assert_eq!(h.next_frame().await["type"], "ping");

        h.shutdown.cancel();
        let outcome = h.task.await.unwrap();
        assert_eq!(outcome.end, SessionEnd::Shutdown);
        assert!(outcome.reached_live);
        assert_eq!(*h.state.borrow(), ConnectionState::Closing);
        assert!(h.slot.get().is_none());

        match h.outbound.next().await {
            Some(Message::Close(Some(frame))) => assert_eq!(frame.code, CloseCode::Normal),
            other => panic!("expected close, got {other:?}"),
        }
        // no ping loop survives the session
        assert!(
            timeout(Duration::from_secs(60), h.outbound.next())
                .await
                .map_or(true, |m| m.is_none())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_close_fails_the_session() {
        let h = Harness::start();
        h.push(r#"{"type":"hello"}"#);
        h.inbound
            .unbounded_send(Ok(close_frame(CloseCode::Away, "rotating")))
            .unwrap();

        let outcome = h.task.await.unwrap();
        assert_eq!(outcome.end, SessionEnd::Closed(Some(CloseCode::Away)));
        assert!(outcome.reached_live);
        assert_eq!(*h.state.borrow(), ConnectionState::Failed);
        assert!(h.slot.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_fails_the_session() {
        let h = Harness::start();
        h.inbound.unbounded_send(Err("reset by peer".into())).unwrap();

        let outcome = h.task.await.unwrap();
        assert_eq!(outcome.end, SessionEnd::Lost("reset by peer".into()));
        assert!(!outcome.reached_live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_error_fails_the_session() {
        let mut h = Harness::start();
        h.push(r#"{"type":"hello"}"#);
        h.settle().await;
        let writer = h.slot.get().unwrap();

        // dropping the receiving end makes every write fail
        h.outbound.close();
        let err = writer
            .send(OutboundKind::Message {
                channel: "C1".into(),
                text: "lost".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RtmError::ConnectionLost(_)));

        let outcome = h.task.await.unwrap();
        assert!(matches!(outcome.end, SessionEnd::Lost(_)));
    }
}
