//! # pedantic-rest
//!
//! REST client for one-shot platform API calls: gateway URL lookup,
//! message posting and deletion, and interaction responses. The gateway
//! client never calls this crate directly; event handlers do.

mod client;
mod error;
mod models;

pub use client::RestClient;
pub use error::RestError;
pub use models::{
    action_row, button, CreateMessageRequest, GatewayInfo, InteractionResponse, MessageReference,
};
