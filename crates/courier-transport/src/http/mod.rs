//! HTTP transport.
//!
//! This module provides the webhook listener and the Web API client.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{HttpClient, HttpResponse};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{HttpServer, ListenerHandle};
