//! MESSAGE_CREATE event handler
//!
//! Intercepts bot commands and, in pedantic mode, runs every word of a
//! message through the corrector. The first misspelled word earns a reply
//! with the suggested correction and a button offering to add the word to
//! the dictionary.

use crate::state::BotState;
use pedantic_corrector::Corrector;
use pedantic_gateway::events::{EventContext, EventHandler, HandlerResult, MessageCreate};
use pedantic_rest::{action_row, button, CreateMessageRequest, RestClient};
use std::sync::Arc;
use uuid::Uuid;

/// Help text sent for the `ayuda` command
fn help_text(prefix: &str) -> String {
    format!(
        "Prefijo: {prefix}\n\
         {prefix}activar: Empieza ser pedantico.\n\
         {prefix}desactivar: Calla al pedantico"
    )
}

/// A detected typo: the offending word and the suggested correction
#[derive(Debug, PartialEq, Eq)]
struct Typo {
    word: String,
    suggestion: String,
}

/// Find the first word whose top correction differs from the word itself
fn find_typo(content: &str, corrector: &dyn Corrector) -> Option<Typo> {
    content
        .replace(',', "")
        .split_whitespace()
        .find_map(|word| {
            let candidates = corrector.correct(word);
            match candidates.first() {
                Some(best) if best != word => Some(Typo {
                    word: word.to_string(),
                    suggestion: best.clone(),
                }),
                _ => None,
            }
        })
}

/// Watches messages for commands and typos
pub struct MessageHandler {
    state: Arc<BotState>,
    corrector: Arc<dyn Corrector>,
    rest: RestClient,
}

impl MessageHandler {
    pub fn new(state: Arc<BotState>, corrector: Arc<dyn Corrector>, rest: RestClient) -> Self {
        Self {
            state,
            corrector,
            rest,
        }
    }

    /// Reply with the current on/off status
    async fn show_status(&self, message: &MessageCreate) -> HandlerResult {
        let reply = if self.state.is_pedantic() {
            "Activado"
        } else {
            "Desactivado"
        };

        self.rest
            .create_message(
                &message.channel_id,
                &CreateMessageRequest::new(reply).replying_to(&message.id),
            )
            .await?;
        Ok(())
    }

    /// Reply with a correction suggestion and an add-to-dictionary button
    async fn suggest_correction(&self, message: &MessageCreate, typo: Typo) -> HandlerResult {
        let prefix = self.state.prefix();
        let reply = format!(
            "Un error tipografico en la palabra *{}*, ¿quisiste decir *{}*?\n\
             Escribe *{prefix}ayuda* para ver mas opciones.",
            typo.word, typo.suggestion,
        );

        let interaction_id = Uuid::new_v4().to_string();
        self.state.save_interaction(&interaction_id, &typo.word);

        let components = vec![action_row(vec![button(
            "Agrega la palabra al diccionario.",
            &interaction_id,
        )])];

        self.rest
            .create_message(
                &message.channel_id,
                &CreateMessageRequest::new(reply)
                    .replying_to(&message.id)
                    .with_components(components),
            )
            .await?;

        tracing::debug!(
            word = %typo.word,
            suggestion = %typo.suggestion,
            channel = %message.channel_id,
            "Correction suggested"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl EventHandler for MessageHandler {
    async fn handle(&self, ctx: EventContext) -> HandlerResult {
        let message: MessageCreate = serde_json::from_value(ctx.data)?;

        // Never react to the bot's own messages
        if let Some(user) = &ctx.user {
            if message.author.id == user.id {
                return Ok(());
            }
        }

        if message.content.chars().count() <= 1 {
            return Ok(());
        }

        if self.state.is_command(&message.content, "activar") {
            self.state.set_pedantic(true);
            return self.show_status(&message).await;
        }

        if self.state.is_command(&message.content, "desactivar") {
            self.state.set_pedantic(false);
            return self.show_status(&message).await;
        }

        if self.state.is_command(&message.content, "ayuda") {
            self.rest
                .create_message(
                    &message.channel_id,
                    &CreateMessageRequest::new(help_text(self.state.prefix())),
                )
                .await?;
            return Ok(());
        }

        if !self.state.is_pedantic() {
            return Ok(());
        }

        if let Some(typo) = find_typo(&message.content, self.corrector.as_ref()) {
            self.suggest_correction(&message, typo).await?;
        }

        Ok(())
    }
}
