//! # Courier Transport
//!
//! Network primitives the provider adapters are built on.
//!
//! ## Features
//!
//! - `http-server`: axum listener with graceful shutdown ([`HttpServer`])
//! - `http-client`: reqwest client for provider Web APIs ([`HttpClient`])
//! - `ws-client`: tungstenite socket connector ([`websocket::connect`])
//! - `full`: all of the above
//!
//! [`Backoff`] (reconnect delays) is always available.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Adapter Layer      │  (LINE, Slack)
//! ├─────────────────────┤
//! │  courier-transport  │  <- This crate
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```

pub mod backoff;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

pub use backoff::Backoff;

#[cfg(feature = "http-client")]
pub use http::{HttpClient, HttpResponse};

#[cfg(feature = "http-server")]
pub use http::{HttpServer, ListenerHandle};
