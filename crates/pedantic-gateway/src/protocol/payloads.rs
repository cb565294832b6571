//! Payload definitions
//!
//! Defines the payload structures carried in the `d` field of gateway
//! frames the client sends or receives during the handshake.

use crate::protocol::GatewayIntents;
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Received from the server immediately after the transport is established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
///
/// Sent by the client to authenticate a fresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Bot token
    pub token: String,

    /// Requested event intents (bit set)
    pub intents: u32,

    /// Client properties
    pub properties: IdentifyProperties,
}

impl IdentifyPayload {
    /// Create an identify payload for the given token and intents
    #[must_use]
    pub fn new(token: impl Into<String>, intents: GatewayIntents) -> Self {
        Self {
            token: token.into(),
            intents: intents.bits(),
            properties: IdentifyProperties::current(),
        }
    }
}

/// Client connection properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    pub os: String,

    /// Client library name
    pub browser: String,

    /// Device name
    pub device: String,
}

impl IdentifyProperties {
    /// Properties describing this client on the current platform
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "pedantic".to_string(),
            device: "pedantic".to_string(),
        }
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self::current()
    }
}

/// Payload for op 6 (Resume)
///
/// Sent by the client to reattach to a dropped session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Bot token
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}
