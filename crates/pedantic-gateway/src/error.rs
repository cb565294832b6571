//! Gateway error types
//!
//! Only fatal conditions surface from the client; every recoverable
//! failure is absorbed by the reconnect path.

/// Fatal gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The platform rejected the bot token; retrying cannot succeed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server closed the connection with a code the policy marks fatal
    #[error("Connection closed with fatal code {code}: {reason}")]
    FatalClose { code: u16, reason: String },
}
