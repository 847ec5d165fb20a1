//! Courier Runtime - configuration, logging and orchestration for the
//! Courier chat-bot gateway.
//!
//! This crate provides:
//! - Layered configuration loading and validation ([`config`])
//! - Logging setup from the `[logging]` section ([`logging`])
//! - The [`CourierRuntime`] that wires adapters, executor and reply senders
//!
//! ```rust,ignore
//! use courier_runtime::CourierRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder()
//!         .handler(PingHandler::new()?)
//!         .build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, CourierConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{CourierRuntime, RunningRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;

/// Logging macros for handler authors.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
