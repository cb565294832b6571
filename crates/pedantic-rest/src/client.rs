//! REST client
//!
//! Thin wrapper over `reqwest` carrying the bot token. Every call is a
//! one-shot request; the persistent event stream lives elsewhere.

use crate::models::{CreateMessageRequest, GatewayInfo, InteractionResponse};
use crate::RestError;

/// Client for the platform REST API
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestClient {
    /// Create a client for the given API base URL and bot token
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Check a response status, draining the body on failure
    async fn check(response: reqwest::Response) -> Result<(), RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "API request failed");

        Err(RestError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Look up the gateway WebSocket URL
    ///
    /// Called once at process start; the session state machine reuses the
    /// result across reconnects (unless the server hands out a resume URL).
    pub async fn gateway_url(&self) -> Result<String, RestError> {
        let response = self
            .http
            .get(format!("{}/gateway/bot", self.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let info: GatewayInfo = response.json().await?;
        Ok(info.url)
    }

    /// Post a message to a channel
    pub async fn create_message(
        &self,
        channel_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<(), RestError> {
        let response = self
            .http
            .post(format!("{}/channels/{channel_id}/messages", self.base_url))
            .header("Authorization", self.auth_header())
            .json(request)
            .send()
            .await?;

        Self::check(response).await
    }

    /// Delete a message from a channel
    pub async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), RestError> {
        let response = self
            .http
            .delete(format!(
                "{}/channels/{channel_id}/messages/{message_id}",
                self.base_url
            ))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Self::check(response).await
    }

    /// Answer an interaction
    ///
    /// The interaction token authorizes the callback on its own; no bot
    /// authorization header is required.
    pub async fn interaction_response(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        response: &InteractionResponse,
    ) -> Result<(), RestError> {
        let http_response = self
            .http
            .post(format!(
                "{}/interactions/{interaction_id}/{interaction_token}/callback",
                self.base_url
            ))
            .json(response)
            .send()
            .await?;

        Self::check(http_response).await
    }
}
