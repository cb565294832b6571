//! Event handlers
//!
//! Handlers registered on the gateway's event dispatcher. Each one parses
//! its event payload and talks to the collaborators (corrector, REST
//! client); none of them touch the session state machine.

mod interaction;
mod message;
mod ready;

pub use interaction::InteractionHandler;
pub use message::MessageHandler;
pub use ready::ReadyHandler;
