//! RTM connection manager.
//!
//! [`SlackRtmAdapter::start`] spawns the connection loop: bootstrap through
//! `rtm.connect`, open the socket, run one session, and on failure retry
//! after a jittered exponential backoff. The loop only stops on shutdown.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{EgressError, EventSink, Reply, ReplySender, async_trait};
use courier_transport::websocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::SlackWebClient;
use crate::config::{RtmConfig, SlackConfig};
use crate::error::{RtmError, RtmResult};
use crate::frame::OutboundKind;
use crate::session::{
    ConnectionState, MessageIdSequence, SessionContext, SessionEnd, WriterSlot, run_session,
};

/// The Slack RTM adapter.
///
/// Owns the frame id sequence and the slot holding the live session's
/// writer, both of which outlive individual connections.
pub struct SlackRtmAdapter {
    web: SlackWebClient,
    rtm: RtmConfig,
    ids: Arc<MessageIdSequence>,
    writer_slot: Arc<WriterSlot>,
    state: watch::Sender<ConnectionState>,
}

impl SlackRtmAdapter {
    /// Builds the adapter; fails when no bot token is configured.
    pub fn new(slack: &SlackConfig, rtm: RtmConfig, http_timeout: Duration) -> RtmResult<Self> {
        let token = slack
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RtmError::Bootstrap("no Slack bot token configured".into()))?;
        let web = SlackWebClient::new(&slack.api_base, token, http_timeout)?;
        Ok(Self::with_client(web, rtm))
    }

    pub fn with_client(web: SlackWebClient, rtm: RtmConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            web,
            rtm,
            ids: Arc::new(MessageIdSequence::new()),
            writer_slot: Arc::new(WriterSlot::new()),
            state,
        }
    }

    /// The reply sender writing through the live session.
    pub fn reply_sender(&self) -> RtmReplySender {
        RtmReplySender {
            writer_slot: Arc::clone(&self.writer_slot),
        }
    }

    /// Subscribes to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Spawns the connection loop feeding `events`.
    pub fn start(self, events: Arc<dyn EventSink>) -> RtmHandle {
        let shutdown = CancellationToken::new();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(events, shutdown.clone()));
        RtmHandle {
            shutdown,
            state,
            task,
        }
    }

    async fn run(self, events: Arc<dyn EventSink>, shutdown: CancellationToken) {
        let mut backoff = self.rtm.reconnect.backoff();
        let ctx = SessionContext {
            ids: Arc::clone(&self.ids),
            writer_slot: Arc::clone(&self.writer_slot),
            events,
            state: self.state.clone(),
            ping_interval: self.rtm.ping_interval(),
            shutdown: shutdown.clone(),
        };

        info!(ping_interval = ?self.rtm.ping_interval(), "Starting Slack RTM adapter");

        loop {
            self.state.send_replace(ConnectionState::Connecting);

            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.connect() => result,
            };

            match connected {
                Ok((sink, stream)) => {
                    let outcome = run_session(sink, stream, &ctx).await;
                    if outcome.reached_live {
                        backoff.reset();
                    }
                    match outcome.end {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Closed(code) => {
                            debug!(?code, "RTM session closed");
                        }
                        SessionEnd::Lost(reason) => {
                            warn!(%reason, "RTM session lost");
                        }
                    }
                }
                Err(e) => {
                    self.state.send_replace(ConnectionState::Failed);
                    error!(error = %e, attempt = backoff.attempts() + 1, "Failed to connect to Slack RTM");
                }
            }

            let delay = backoff.next_delay();
            info!(delay = ?delay, attempt = backoff.attempts(), "Reconnecting to Slack RTM");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        info!("Slack RTM adapter stopped");
    }

    async fn connect(&self) -> RtmResult<(websocket::WsSink, websocket::WsSource)> {
        let endpoint = self.web.rtm_connect().await?;
        Ok(websocket::connect(&endpoint.url).await?)
    }
}

/// Handle to a running RTM adapter.
pub struct RtmHandle {
    shutdown: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl RtmHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Waits until the connection reaches `target`.
    pub async fn wait_for(&mut self, target: ConnectionState) -> bool {
        self.state.wait_for(|s| *s == target).await.is_ok()
    }

    /// Closes the live session with a NORMAL close and stops reconnecting.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Slack RTM task failed");
        }
    }
}

/// [`ReplySender`] for Slack: one message frame per reply text.
#[derive(Clone)]
pub struct RtmReplySender {
    writer_slot: Arc<WriterSlot>,
}

#[async_trait]
impl ReplySender for RtmReplySender {
    async fn send(&self, reply: &Reply) -> Result<(), EgressError> {
        let writer = self
            .writer_slot
            .get()
            .ok_or_else(|| EgressError::from(RtmError::NotLive))?;
        let channel = reply.ctx.reply_target().as_str();
        for text in &reply.messages {
            let id = writer
                .send(OutboundKind::Message {
                    channel: channel.to_string(),
                    text: text.clone(),
                })
                .await?;
            debug!(
                correlation_id = %reply.ctx.correlation_id(),
                id,
                channel,
                "Reply written"
            );
        }
        Ok(())
    }
}
