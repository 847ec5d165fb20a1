//! Runtime error types.

use courier_adapter_slack::RtmError;
use courier_core::TransportError;
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that prevent the runtime from starting.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The webhook listener or a provider client could not be created.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The RTM adapter could not be created.
    #[error("RTM adapter error: {0}")]
    Rtm(#[from] RtmError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
