//! WebSocket transport
//!
//! `tokio-tungstenite` implementation of the transport traits.

use super::{Connector, Transport, TransportError, TransportEvent, TransportSink, TransportStream};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector backed by `tokio_tungstenite::connect_async`
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::debug!(%url, "WebSocket connection established");

        Ok(Box::new(WebSocketTransport { stream }))
    }
}

/// Established WebSocket connection
struct WebSocketTransport {
    stream: WsStream,
}

impl Transport for WebSocketTransport {
    fn split(self: Box<Self>) -> (Box<dyn TransportSink>, Box<dyn TransportStream>) {
        let (sink, stream) = self.stream.split();
        (
            Box::new(WebSocketSink { sink }),
            Box::new(WebSocketReader { stream }),
        )
    }
}

struct WebSocketSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSink for WebSocketSink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }
}

struct WebSocketReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportStream for WebSocketReader {
    async fn next(&mut self) -> Option<Result<TransportEvent, TransportError>> {
        loop {
            return match self.stream.next().await? {
                Ok(Message::Text(text)) => Some(Ok(TransportEvent::Text(text))),
                Ok(Message::Close(frame)) => {
                    Some(Ok(TransportEvent::Closed(frame.map(|f| u16::from(f.code)))))
                }
                Ok(Message::Binary(_)) => Some(Err(TransportError::WebSocket(
                    "binary frames not supported".to_string(),
                ))),
                // Pings are answered by the library during polling
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => Some(Err(TransportError::WebSocket(e.to_string()))),
            };
        }
    }
}
