//! Event dispatcher
//!
//! Routes decoded dispatch frames to registered handlers. Handlers for one
//! event run in registration order; a failing or panicking handler never
//! affects the others or the read loop.

use super::CurrentUser;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Result type returned by event handlers
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Handler for one gateway event
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one dispatched event
    async fn handle(&self, ctx: EventContext) -> HandlerResult;
}

/// Context passed to every handler invocation
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Event name (the frame's `t` field)
    pub event: String,

    /// Raw event payload
    pub data: Value,

    /// The bot's own user, known once the handshake completed
    pub user: Option<CurrentUser>,
}

/// String-keyed registry of event handlers
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dispatcher wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a handler for an event name
    ///
    /// Handlers for the same event run in registration order.
    pub fn register(&self, event: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let event = event.into();
        self.handlers.write().entry(event.clone()).or_default().push(handler);

        tracing::debug!(event = %event, "Event handler registered");
    }

    /// Number of handlers registered for an event
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Dispatch an event to every registered handler
    ///
    /// Unknown event names are a no-op. Handler errors and panics are
    /// logged and swallowed so the remaining handlers still run.
    pub async fn dispatch(&self, ctx: EventContext) {
        let handlers = self.handlers.read().get(&ctx.event).cloned();

        let Some(handlers) = handlers else {
            tracing::trace!(event = %ctx.event, "No handler for event");
            return;
        };

        for (index, handler) in handlers.iter().enumerate() {
            let invocation = AssertUnwindSafe(handler.handle(ctx.clone())).catch_unwind();

            match invocation.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        event = %ctx.event,
                        handler = index,
                        error = %e,
                        "Event handler failed"
                    );
                }
                Err(_) => {
                    tracing::error!(
                        event = %ctx.event,
                        handler = index,
                        "Event handler panicked"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("events", &self.handlers.read().keys().cloned().collect::<Vec<_>>())
            .finish()
    }
}
