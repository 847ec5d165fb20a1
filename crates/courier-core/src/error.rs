//! Unified error types for the Courier core.
//!
//! Adapter-specific errors (signature, payload decoding, RTM session) live in
//! the adapter crates; configuration and startup errors live in the runtime.

use thiserror::Error;

use crate::platform::Platform;

// =============================================================================
// Handler Errors
// =============================================================================

/// A handler failed while producing replies.
///
/// The executor logs it with the request's correlation id and moves on to
/// the next handler; it never reaches the provider.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The handler reported a failure.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The handler panicked while being invoked or polled.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Creates a failure from any displayable message.
    pub fn failed(msg: impl std::fmt::Display) -> Self {
        Self::Failed(msg.to_string())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Egress Errors
// =============================================================================

/// Errors raised while delivering a reply back to a provider.
#[derive(Debug, Clone, Error)]
pub enum EgressError {
    /// No reply sender is configured for the platform.
    #[error("no reply sender configured for platform '{0}'")]
    Unavailable(Platform),

    /// The provider answered with a non-success status.
    #[error("provider rejected reply with HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The RTM socket is not live, or its writer has stopped.
    #[error("not connected: {0}")]
    NotConnected(String),

    /// The reply call did not complete in time.
    #[error("reply timed out")]
    Timeout,

    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Any other egress failure.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Submission Errors
// =============================================================================

/// Errors returned when handing an event to the executor.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    /// The work pool is shutting down and no longer accepts events.
    #[error("work pool is closed")]
    Closed,

    /// The work pool queue is full.
    #[error("work pool is saturated")]
    Saturated,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for reply delivery.
pub type EgressResult<T> = Result<T, EgressError>;
