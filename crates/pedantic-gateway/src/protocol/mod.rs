//! Gateway wire protocol
//!
//! Frame format, operation codes, payload shapes, and close codes for the
//! persistent connection.

mod close_codes;
mod frames;
mod intents;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use frames::{DecodeError, GatewayFrame};
pub use intents::GatewayIntents;
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, IdentifyPayload, IdentifyProperties, ResumePayload};
