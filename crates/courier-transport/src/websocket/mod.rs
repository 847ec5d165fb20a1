//! WebSocket transport.

mod client;

pub use client::{WsSink, WsSource, WsStream, close_frame, connect};

pub use tokio_tungstenite::tungstenite::Message;
pub use tokio_tungstenite::tungstenite::protocol::CloseFrame;
pub use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
