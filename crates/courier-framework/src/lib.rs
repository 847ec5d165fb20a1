//! # Courier Framework
//!
//! The message-handling pipeline of the Courier gateway:
//!
//! - [`WorkPool`]: fixed workers draining a bounded event queue
//! - [`Dispatcher`]: the handler chain executor, implements [`EventSink`]
//! - [`ReplyRouter`] and [`egress_service`]: per-platform reply delivery with
//!   a per-call timeout
//! - [`handlers`]: built-in `echo` and `ping` handlers and [`handler_fn`]
//!
//! [`EventSink`]: courier_core::EventSink

pub mod dispatcher;
pub mod egress;
pub mod handlers;
pub mod pool;

pub use dispatcher::{AckMode, Dispatcher, DispatcherBuilder};
pub use egress::{EgressService, ReplyRouter, egress_service};
pub use handlers::{EchoHandler, HandlerFn, PingHandler, handler_fn};
pub use pool::WorkPool;
