//! Application configuration structs
//!
//! Loads configuration from environment variables and the `.env` file.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub discord: DiscordConfig,
    pub bot: BotConfig,
    pub gateway: GatewayTuning,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Discord application credentials
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Application client identifier
    pub client_id: String,
    /// Application client secret (used for token exchanges)
    pub client_secret: String,
    /// Bot token used for gateway identify and REST authorization
    pub token: String,
    /// Base URL of the platform REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Bot behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Prefix the bot intercepts as commands
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Path to the word-frequency model file
    pub model_path: PathBuf,
}

/// Gateway client tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayTuning {
    /// Bounded wait for establishing the transport, in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bounded wait for each handshake phase (hello, identify ack), in milliseconds
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Base reconnect delay, in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Maximum reconnect delay, in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Close codes treated as resumable, overriding the built-in policy table
    #[serde(default)]
    pub resumable_close_codes: Option<Vec<u16>>,
}

impl Default for GatewayTuning {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            resumable_close_codes: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "pedantic-bot".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_handshake_timeout_ms() -> u64 {
    30_000
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            discord: DiscordConfig {
                client_id: env::var("DISCORD_CLIENT_ID")
                    .map_err(|_| ConfigError::MissingVar("DISCORD_CLIENT_ID"))?,
                client_secret: env::var("DISCORD_CLIENT_SECRET")
                    .map_err(|_| ConfigError::MissingVar("DISCORD_CLIENT_SECRET"))?,
                token: env::var("DISCORD_CLIENT_TOKEN")
                    .map_err(|_| ConfigError::MissingVar("DISCORD_CLIENT_TOKEN"))?,
                api_base_url: env::var("DISCORD_API_BASE_URL")
                    .unwrap_or_else(|_| default_api_base_url()),
            },
            bot: BotConfig {
                prefix: env::var("BOT_PREFIX").unwrap_or_else(|_| default_prefix()),
                model_path: env::var("MODEL_PATH")
                    .map(PathBuf::from)
                    .map_err(|_| ConfigError::MissingVar("MODEL_PATH"))?,
            },
            gateway: GatewayTuning {
                connect_timeout_ms: env::var("GATEWAY_CONNECT_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_connect_timeout_ms),
                handshake_timeout_ms: env::var("GATEWAY_HANDSHAKE_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_handshake_timeout_ms),
                backoff_base_ms: env::var("GATEWAY_BACKOFF_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_backoff_base_ms),
                backoff_max_ms: env::var("GATEWAY_BACKOFF_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_backoff_max_ms),
                resumable_close_codes: env::var("GATEWAY_RESUMABLE_CLOSE_CODES")
                    .ok()
                    .map(|s| parse_code_list(&s))
                    .transpose()?,
            },
        })
    }
}

/// Parse a comma-separated list of close codes
fn parse_code_list(raw: &str) -> Result<Vec<u16>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue("GATEWAY_RESUMABLE_CLOSE_CODES", s.to_string())
            })
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
