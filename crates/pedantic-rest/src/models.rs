//! REST request and response shapes

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response of `GET /gateway/bot`
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayInfo {
    /// WebSocket URL the client should connect to
    pub url: String,
}

/// Body of `POST /channels/{id}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    /// Message content
    pub content: String,

    /// Message to reference (turns this message into a reply)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,

    /// Optional interactive components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Value>>,
}

impl CreateMessageRequest {
    /// Create a plain message
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_reference: None,
            components: None,
        }
    }

    /// Turn the message into a reply to another message
    #[must_use]
    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.message_reference = Some(MessageReference {
            message_id: message_id.into(),
        });
        self
    }

    /// Attach component rows
    #[must_use]
    pub fn with_components(mut self, components: Vec<Value>) -> Self {
        self.components = Some(components);
        self
    }
}

/// Reference to another message
#[derive(Debug, Clone, Serialize)]
pub struct MessageReference {
    pub message_id: String,
}

/// Body of `POST /interactions/{id}/{token}/callback`
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    /// Interaction callback type: pong (no-op acknowledgement)
    pub const PONG: u8 = 1;
    /// Interaction callback type: respond with a message
    pub const CHANNEL_MESSAGE: u8 = 4;

    /// Acknowledge an interaction without visible effect
    #[must_use]
    pub fn pong() -> Self {
        Self {
            kind: Self::PONG,
            data: None,
        }
    }

    /// Respond to an interaction with a text message
    #[must_use]
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: Self::CHANNEL_MESSAGE,
            data: Some(json!({ "content": content.into() })),
        }
    }
}

/// Build a secondary-style button component
#[must_use]
pub fn button(label: impl Into<String>, custom_id: impl Into<String>) -> Value {
    json!({
        "type": 2,
        "style": 2,
        "label": label.into(),
        "custom_id": custom_id.into(),
    })
}

/// Wrap components in an action row
#[must_use]
pub fn action_row(components: Vec<Value>) -> Value {
    json!({
        "type": 1,
        "components": components,
    })
}
