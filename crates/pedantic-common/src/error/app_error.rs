//! Application error types
//!
//! Unified error handling for the bot process. Only fatal conditions are
//! represented here; recoverable gateway errors never cross the crate
//! boundary.

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded or was malformed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The platform rejected the bot's credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The word model could not be loaded
    #[error("Model error: {0}")]
    Model(String),

    /// External service error (REST API)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal error
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
