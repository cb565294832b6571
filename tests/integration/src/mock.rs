//! Scripted in-memory transport
//!
//! Each scripted connection is a pair of channels: the test pushes
//! transport events to the client and records every text frame the client
//! writes. The connector hands out connections in order, then fails.

use async_trait::async_trait;
use pedantic_gateway::transport::{
    Connector, Transport, TransportError, TransportEvent, TransportSink, TransportStream,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// The server's side of one scripted connection
pub struct ServerEnd {
    sent_rx: mpsc::UnboundedReceiver<String>,
    push_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl ServerEnd {
    /// Push a raw text frame to the client
    pub fn send_text(&self, json: impl Into<String>) {
        let _ = self.push_tx.send(TransportEvent::Text(json.into()));
    }

    /// Close the connection, optionally with a close code
    pub fn close(&self, code: Option<u16>) {
        let _ = self.push_tx.send(TransportEvent::Closed(code));
    }

    /// Send the hello frame
    pub fn send_hello(&self, interval_ms: u64) {
        self.send_text(format!(
            r#"{{"op":10,"d":{{"heartbeat_interval":{interval_ms}}}}}"#
        ));
    }

    /// Send the ready dispatch completing an identify
    pub fn send_ready(&self, seq: u64, session_id: &str, resume_url: Option<&str>) {
        let resume = resume_url
            .map(|url| format!(r#","resume_gateway_url":"{url}""#))
            .unwrap_or_default();
        self.send_text(format!(
            r#"{{"op":0,"t":"READY","s":{seq},"d":{{"v":9,"user":{{"id":"99","username":"pedantic","bot":true}},"session_id":"{session_id}"{resume}}}}}"#
        ));
    }

    /// Send a dispatch frame
    pub fn send_dispatch(&self, event: &str, seq: u64, data: &str) {
        self.send_text(format!(r#"{{"op":0,"t":"{event}","s":{seq},"d":{data}}}"#));
    }

    /// Send the resumed dispatch ending a replay
    pub fn send_resumed(&self, seq: u64) {
        self.send_dispatch("RESUMED", seq, "{}");
    }

    /// Acknowledge a heartbeat
    pub fn ack_heartbeat(&self) {
        self.send_text(r#"{"op":11}"#);
    }

    /// Request an immediate reconnect
    pub fn request_reconnect(&self) {
        self.send_text(r#"{"op":7}"#);
    }

    /// Declare the session invalid
    pub fn send_invalid_session(&self, resumable: bool) {
        self.send_text(format!(r#"{{"op":9,"d":{resumable}}}"#));
    }

    /// Next frame the client sent, parsed
    pub async fn recv_json(&mut self) -> Value {
        let text = self
            .sent_rx
            .recv()
            .await
            .expect("client ended the connection without sending");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Next frame the client sent, skipping heartbeats
    pub async fn recv_non_heartbeat(&mut self) -> Value {
        loop {
            let frame = self.recv_json().await;
            if frame["op"] != 1 {
                return frame;
            }
        }
    }

    /// Next heartbeat the client sent
    pub async fn recv_heartbeat(&mut self) -> Value {
        loop {
            let frame = self.recv_json().await;
            if frame["op"] == 1 {
                return frame;
            }
        }
    }
}

/// Connector handing out scripted connections in order
pub struct MockConnector {
    pending: Mutex<VecDeque<MockTransport>>,
    urls: Mutex<Vec<String>>,
}

impl MockConnector {
    /// Script `connections` consecutive transports
    pub fn script(connections: usize) -> (Arc<Self>, Vec<ServerEnd>) {
        let mut pending = VecDeque::new();
        let mut servers = Vec::new();

        for _ in 0..connections {
            let (push_tx, push_rx) = mpsc::unbounded_channel();
            let (sent_tx, sent_rx) = mpsc::unbounded_channel();

            pending.push_back(MockTransport { push_rx, sent_tx });
            servers.push(ServerEnd { sent_rx, push_tx });
        }

        let connector = Arc::new(Self {
            pending: Mutex::new(pending),
            urls: Mutex::new(Vec::new()),
        });

        (connector, servers)
    }

    /// URLs the client connected to, in order
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        self.urls.lock().unwrap().push(url.to_string());

        match self.pending.lock().unwrap().pop_front() {
            Some(transport) => Ok(Box::new(transport)),
            None => Err(TransportError::Connect("no scripted transport left".to_string())),
        }
    }
}

struct MockTransport {
    push_rx: mpsc::UnboundedReceiver<TransportEvent>,
    sent_tx: mpsc::UnboundedSender<String>,
}

impl Transport for MockTransport {
    fn split(self: Box<Self>) -> (Box<dyn TransportSink>, Box<dyn TransportStream>) {
        (
            Box::new(MockSink { tx: self.sent_tx }),
            Box::new(MockStream { rx: self.push_rx }),
        )
    }
}

struct MockSink {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl TransportSink for MockSink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.tx
            .send(text)
            .map_err(|_| TransportError::WebSocket("peer gone".to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
impl TransportStream for MockStream {
    async fn next(&mut self) -> Option<Result<TransportEvent, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}
