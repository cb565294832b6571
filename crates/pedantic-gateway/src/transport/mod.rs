//! Transport abstraction
//!
//! A message-framed, full-duplex connection to the gateway endpoint. The
//! trait seam exists so tests can drive the session state machine against
//! an in-memory transport; production uses the WebSocket implementation.

mod websocket;

pub use websocket::WebSocketConnector;

use async_trait::async_trait;

/// Transport-level errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The established connection failed
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

/// An event read from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame carrying one JSON gateway frame
    Text(String),
    /// The peer closed the connection, possibly with a close code
    Closed(Option<u16>),
}

/// Established full-duplex connection
///
/// Split into halves so the single-writer task and the read loop can run
/// concurrently against the same socket.
pub trait Transport: Send {
    /// Split into write and read halves
    fn split(self: Box<Self>) -> (Box<dyn TransportSink>, Box<dyn TransportStream>);
}

/// Write half of a transport
#[async_trait]
pub trait TransportSink: Send {
    /// Send one text frame
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a transport
#[async_trait]
pub trait TransportStream: Send {
    /// Receive the next event; `None` means the stream ended
    async fn next(&mut self) -> Option<Result<TransportEvent, TransportError>>;
}

/// Establishes transports to a gateway URL
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}
