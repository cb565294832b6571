//! Pedantic bot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p pedantic-bot
//! ```
//!
//! Configuration is loaded from environment variables.

use pedantic_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the bot
    if let Err(e) = run().await {
        error!(error = %e, "Bot failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Pedantic bot...");

    // Load configuration; missing values are fatal before any connection
    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        prefix = %config.bot.prefix,
        model = %config.bot.model_path.display(),
        "Configuration loaded"
    );

    pedantic_bot::run(config).await?;

    Ok(())
}
