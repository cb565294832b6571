//! READY event handler

use pedantic_gateway::events::{EventContext, EventHandler, HandlerResult, ReadyEvent};

/// Logs the session start
pub struct ReadyHandler;

#[async_trait::async_trait]
impl EventHandler for ReadyHandler {
    async fn handle(&self, ctx: EventContext) -> HandlerResult {
        let ready: ReadyEvent = serde_json::from_value(ctx.data)?;

        tracing::info!(
            username = %ready.user.username,
            "Logged in"
        );

        Ok(())
    }
}
