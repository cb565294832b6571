//! REST error types

/// Errors from the platform REST API
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl RestError {
    /// Whether the API rejected the bot's credentials
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}
