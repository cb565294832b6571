//! INTERACTION_CREATE event handler
//!
//! Answers button presses. A known component id means the user accepted
//! adding a word to the dictionary; anything else gets a pong so the
//! platform stops waiting.

use crate::state::BotState;
use pedantic_corrector::Corrector;
use pedantic_gateway::events::{EventContext, EventHandler, HandlerResult, InteractionCreate};
use pedantic_rest::{InteractionResponse, RestClient};
use std::sync::Arc;

/// Handles add-to-dictionary button presses
pub struct InteractionHandler {
    state: Arc<BotState>,
    corrector: Arc<dyn Corrector>,
    rest: RestClient,
}

impl InteractionHandler {
    pub fn new(state: Arc<BotState>, corrector: Arc<dyn Corrector>, rest: RestClient) -> Self {
        Self {
            state,
            corrector,
            rest,
        }
    }

    /// Add the word, confirm, and remove the original suggestion message
    async fn register_word(&self, word: &str, interaction: &InteractionCreate) -> HandlerResult {
        self.corrector.add_word(word)?;

        self.rest
            .interaction_response(
                &interaction.id,
                &interaction.token,
                &InteractionResponse::message(format!("Se agrego {word} al diccionario.")),
            )
            .await?;

        if let Some(message) = &interaction.message {
            self.rest
                .delete_message(&message.channel_id, &message.id)
                .await?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl EventHandler for InteractionHandler {
    async fn handle(&self, ctx: EventContext) -> HandlerResult {
        let interaction: InteractionCreate = serde_json::from_value(ctx.data)?;

        let word = interaction
            .data
            .as_ref()
            .and_then(|data| data.custom_id.as_ref())
            .and_then(|custom_id| self.state.get_interaction(custom_id));

        match word {
            Some(word) => self.register_word(&word, &interaction).await,
            None => {
                // Not ours (or expired): acknowledge so the platform
                // stops the spinner
                self.rest
                    .interaction_response(
                        &interaction.id,
                        &interaction.token,
                        &InteractionResponse::pong(),
                    )
                    .await?;
                Ok(())
            }
        }
    }
}
