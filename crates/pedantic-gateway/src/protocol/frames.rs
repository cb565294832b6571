//! Gateway frame format
//!
//! Defines the structure for all messages exchanged over the persistent
//! connection: `{op, t?, s?, d?}`.

use super::{HelloPayload, IdentifyPayload, OpCode, ResumePayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame decoding errors
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Malformed JSON or an invalid mandatory field (e.g. unknown op code)
    #[error("Invalid frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gateway frame
///
/// Every message on the connection follows this shape. Unknown fields are
/// ignored on decode for forward compatibility; `t` and `s` are only
/// present on dispatch frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub s: Option<u64>,

    /// Payload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<Value>,
}

impl GatewayFrame {
    // === Outbound intents ===

    /// Create a Heartbeat frame (op=1) carrying the last received sequence
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: last_sequence.map(|s| Value::Number(s.into())),
        }
    }

    /// Create an Identify frame (op=2)
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self {
            op: OpCode::Identify,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    /// Create a Resume frame (op=6)
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self {
            op: OpCode::Resume,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    // === Parsing inbound frames ===

    /// Try to parse as a Hello payload (op=10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse the Invalid Session resumable flag (op=9)
    ///
    /// A missing or non-boolean payload is treated as not resumable.
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    /// Event name of a dispatch frame (op=0)
    pub fn event_name(&self) -> Option<&str> {
        if self.op != OpCode::Dispatch {
            return None;
        }
        self.t.as_deref()
    }

    // === Codec ===

    /// Serialize to JSON text
    ///
    /// Never fails for the well-formed intents built by the constructors
    /// above.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON text
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for GatewayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayFrame(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayFrame(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GatewayIntents;

    #[test]
    fn test_heartbeat_frame() {
        let msg = GatewayFrame::heartbeat(Some(41));
        assert_eq!(msg.op, OpCode::Heartbeat);
        assert_eq!(msg.d, Some(Value::Number(41.into())));

        let json = msg.to_json().unwrap();
        assert_eq!(json, r#"{"op":1,"d":41}"#);

        let empty = GatewayFrame::heartbeat(None).to_json().unwrap();
        assert_eq!(empty, r#"{"op":1}"#);
    }

    #[test]
    fn test_identify_frame() {
        let payload = IdentifyPayload::new("token123", GatewayIntents::message_reader());
        let msg = GatewayFrame::identify(&payload);

        assert_eq!(msg.op, OpCode::Identify);
        let json = msg.to_json().unwrap();
        assert!(json.contains("token123"));
        assert!(json.contains("intents"));
    }

    #[test]
    fn test_resume_frame() {
        let payload = ResumePayload {
            token: "token123".to_string(),
            session_id: "session456".to_string(),
            seq: 7,
        };
        let msg = GatewayFrame::resume(&payload);

        assert_eq!(msg.op, OpCode::Resume);
        let json = msg.to_json().unwrap();
        assert!(json.contains("session456"));
    }

    #[test]
    fn test_parse_hello() {
        let frame =
            GatewayFrame::from_json(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        let hello = frame.as_hello().unwrap();
        assert_eq!(hello.heartbeat_interval, 41_250);
    }

    #[test]
    fn test_parse_invalid_session() {
        let resumable = GatewayFrame::from_json(r#"{"op":9,"d":true}"#).unwrap();
        assert_eq!(resumable.as_invalid_session(), Some(true));

        let not_resumable = GatewayFrame::from_json(r#"{"op":9,"d":false}"#).unwrap();
        assert_eq!(not_resumable.as_invalid_session(), Some(false));

        // Missing payload defaults to not resumable
        let bare = GatewayFrame::from_json(r#"{"op":9}"#).unwrap();
        assert_eq!(bare.as_invalid_session(), Some(false));

        let hello = GatewayFrame::from_json(r#"{"op":10,"d":{"heartbeat_interval":1}}"#).unwrap();
        assert_eq!(hello.as_invalid_session(), None);
    }

    #[test]
    fn test_parse_dispatch() {
        let frame = GatewayFrame::from_json(
            r#"{"op":0,"t":"MESSAGE_CREATE","s":42,"d":{"id":"12345","content":"hola"}}"#,
        )
        .unwrap();

        assert_eq!(frame.op, OpCode::Dispatch);
        assert_eq!(frame.event_name(), Some("MESSAGE_CREATE"));
        assert_eq!(frame.s, Some(42));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(GatewayFrame::from_json("not json").is_err());
        assert!(GatewayFrame::from_json("{}").is_err());
        // Unknown op code is a mandatory-field violation
        assert!(GatewayFrame::from_json(r#"{"op":99}"#).is_err());
    }

    #[test]
    fn test_decode_ignores_unknown_optional_fields() {
        let frame = GatewayFrame::from_json(
            r#"{"op":11,"future_field":{"nested":true}}"#,
        )
        .unwrap();
        assert_eq!(frame.op, OpCode::HeartbeatAck);
    }

    #[test]
    fn test_frame_roundtrip() {
        let frame = GatewayFrame::from_json(r#"{"op":0,"t":"READY","s":1,"d":{"v":9}}"#).unwrap();
        let json = frame.to_json().unwrap();
        let parsed = GatewayFrame::from_json(&json).unwrap();

        assert_eq!(parsed.op, frame.op);
        assert_eq!(parsed.t, frame.t);
        assert_eq!(parsed.s, frame.s);
    }

    #[test]
    fn test_frame_display() {
        let frame =
            GatewayFrame::from_json(r#"{"op":0,"t":"MESSAGE_CREATE","s":5,"d":{}}"#).unwrap();
        let display = format!("{frame}");
        assert!(display.contains("MESSAGE_CREATE"));
        assert!(display.contains("s=5"));

        let ack = GatewayFrame::from_json(r#"{"op":11}"#).unwrap();
        assert!(format!("{ack}").contains("HeartbeatAck"));
    }
}
