//! Application events
//!
//! Event names, decoded payload shapes, and the handler registry that
//! dispatch frames are routed through.

mod dispatcher;
mod event_types;
mod payloads;

pub use dispatcher::{EventContext, EventDispatcher, EventHandler, HandlerResult};
pub use event_types::GatewayEventType;
pub use payloads::{
    CurrentUser, InteractionCreate, InteractionData, InteractionMessage, MessageAuthor,
    MessageCreate, ReadyEvent,
};
