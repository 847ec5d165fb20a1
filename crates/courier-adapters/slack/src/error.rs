//! Error types for the Slack RTM adapter.

use courier_core::{EgressError, TransportError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RtmError {
    /// `rtm.connect` did not yield a socket URL.
    #[error("rtm.connect failed: {0}")]
    Bootstrap(String),

    /// The socket failed or was closed by the provider.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The session's writer has stopped.
    #[error("RTM writer is closed")]
    WriterClosed,

    /// No session is live.
    #[error("RTM session is not live")]
    NotLive,

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<RtmError> for EgressError {
    fn from(err: RtmError) -> Self {
        match err {
            RtmError::Transport(e) => EgressError::Transport(e),
            RtmError::Encode(e) => EgressError::Other(e),
            other => EgressError::NotConnected(other.to_string()),
        }
    }
}

pub type RtmResult<T> = Result<T, RtmError>;
