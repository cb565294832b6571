//! Event payload shapes
//!
//! Decoded `d` payloads for the events this client consumes. Every struct
//! tolerates unknown fields so new server-side additions never break
//! decoding.

use serde::{Deserialize, Serialize};

/// Payload of the READY event
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    #[serde(default)]
    pub v: u32,

    /// The bot's own user
    pub user: CurrentUser,

    /// Session identifier used for resuming
    pub session_id: String,

    /// URL to reconnect to when resuming
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

/// The authenticated bot user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// User identifier
    pub id: String,

    /// Account name
    pub username: String,

    /// Whether this account is a bot
    #[serde(default)]
    pub bot: bool,
}

/// Payload of the MESSAGE_CREATE event
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    /// Message identifier
    pub id: String,

    /// Channel the message was posted in
    pub channel_id: String,

    /// Guild the channel belongs to (absent in direct messages)
    #[serde(default)]
    pub guild_id: Option<String>,

    /// Message text (empty without the message-content intent)
    #[serde(default)]
    pub content: String,

    /// Message author
    pub author: MessageAuthor,
}

/// Author of a message
#[derive(Debug, Clone, Deserialize)]
pub struct MessageAuthor {
    /// User identifier
    pub id: String,

    /// Account name
    pub username: String,

    /// Whether the author is a bot
    #[serde(default)]
    pub bot: bool,
}

/// Payload of the INTERACTION_CREATE event
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionCreate {
    /// Interaction identifier
    pub id: String,

    /// Callback token, valid briefly after creation
    pub token: String,

    /// Component data (present for component interactions)
    #[serde(default)]
    pub data: Option<InteractionData>,

    /// The message the component was attached to
    #[serde(default)]
    pub message: Option<InteractionMessage>,
}

/// Component data of an interaction
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    /// Id the client chose when creating the component
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// Message an interaction originated from
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionMessage {
    /// Message identifier
    pub id: String,

    /// Channel the message lives in
    pub channel_id: String,
}
