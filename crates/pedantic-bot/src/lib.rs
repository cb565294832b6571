//! # pedantic-bot
//!
//! Wires the collaborators together: loads the word model, looks up the
//! gateway URL over REST, registers the event handlers, and runs the
//! gateway client until shutdown or a fatal error.

pub mod handlers;
pub mod state;

use handlers::{InteractionHandler, MessageHandler, ReadyHandler};
use pedantic_common::{AppConfig, AppError, AppResult};
use pedantic_corrector::{Corrector, NorvigCorrector, TsvModelStore};
use pedantic_gateway::events::{EventDispatcher, GatewayEventType};
use pedantic_gateway::{GatewayClient, GatewayConfig, GatewayError};
use pedantic_rest::RestClient;
use state::BotState;
use std::sync::Arc;

/// Build the dispatcher with every bot handler registered
fn build_dispatcher(
    bot_state: &Arc<BotState>,
    corrector: &Arc<dyn Corrector>,
    rest: &RestClient,
) -> Arc<EventDispatcher> {
    let dispatcher = EventDispatcher::new_shared();

    dispatcher.register(GatewayEventType::Ready.as_str(), Arc::new(ReadyHandler));
    dispatcher.register(
        GatewayEventType::MessageCreate.as_str(),
        Arc::new(MessageHandler::new(
            bot_state.clone(),
            corrector.clone(),
            rest.clone(),
        )),
    );
    dispatcher.register(
        GatewayEventType::InteractionCreate.as_str(),
        Arc::new(InteractionHandler::new(
            bot_state.clone(),
            corrector.clone(),
            rest.clone(),
        )),
    );

    dispatcher
}

/// Run the bot until shutdown or a fatal error
pub async fn run(config: AppConfig) -> AppResult<()> {
    // Word model; a missing or malformed file is fatal at startup
    let store = Arc::new(TsvModelStore::new(config.bot.model_path.clone()));
    let corrector: Arc<dyn Corrector> = Arc::new(
        NorvigCorrector::from_store(store).map_err(|e| AppError::Model(e.to_string()))?,
    );

    let rest = RestClient::new(config.discord.api_base_url.clone(), config.discord.token.clone());

    // One-shot lookup of the gateway endpoint
    let gateway_url = rest.gateway_url().await.map_err(|e| {
        if e.is_unauthorized() {
            AppError::AuthenticationFailed(e.to_string())
        } else {
            AppError::ExternalService(e.to_string())
        }
    })?;
    tracing::info!(%gateway_url, "Gateway endpoint resolved");

    let bot_state = Arc::new(BotState::new(config.bot.prefix.clone()));
    let dispatcher = build_dispatcher(&bot_state, &corrector, &rest);

    let gateway_config = GatewayConfig::from_app(&config, gateway_url);
    let (client, shutdown) = GatewayClient::new(gateway_config, dispatcher);

    // Ctrl-C requests a graceful shutdown from any state
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown.shutdown();
        }
    });

    client.run().await.map_err(|e| match e {
        GatewayError::AuthenticationFailed(reason) => AppError::AuthenticationFailed(reason),
        other @ GatewayError::FatalClose { .. } => AppError::ExternalService(other.to_string()),
    })
}
