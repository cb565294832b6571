//! # pedantic-gateway
//!
//! Minimal real-time gateway client. Owns the persistent connection to the
//! platform's event stream and keeps it alive under the session protocol:
//! handshake, identify, heartbeating, resume, and paced reconnection.
//!
//! Decoded application events are routed through the [`events::EventDispatcher`];
//! everything else (REST calls, spelling correction) lives in collaborator
//! crates and is invoked from registered handlers, never from here.

pub mod client;
pub mod events;
pub mod protocol;
pub mod transport;

mod error;

pub use client::{GatewayClient, GatewayConfig, SessionState, ShutdownHandle};
pub use error::GatewayError;
