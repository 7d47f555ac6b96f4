//! Telegram Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Extra time allowed on top of the long-poll timeout before a request is abandoned.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: SecretString,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Create a new client. `poll_timeout` is the server-side long-poll wait.
    pub fn new(
        api_url: impl Into<String>,
        token: SecretString,
        poll_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TelegramError> {
        let body = response.text().await?;
        let reply: ApiResponse<T> = serde_json::from_str(&body)?;

        match reply {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| "no description".into()),
            )),
        }
    }

    /// Check if the token is valid and the API reachable.
    pub async fn health_check(&self) -> bool {
        self.get_me().await.is_ok()
    }

    /// The bot's own account.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        Self::parse(response).await
    }

    /// Long-poll for updates with id `offset` or later.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let timeout = self.poll_timeout.as_secs().to_string();
        let offset = offset.to_string();
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.as_str()),
                ("timeout", timeout.as_str()),
                ("allowed_updates", "[\"message\"]"),
            ])
            .send()
            .await?;

        let updates: Vec<Update> = Self::parse(response).await?;
        if !updates.is_empty() {
            debug!("Received {} updates", updates.len());
        }
        Ok(updates)
    }

    /// Send an HTML-formatted message to a chat.
    #[instrument(skip(self, html))]
    pub async fn send_message(&self, chat_id: i64, html: &str) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: html.to_string(),
            parse_mode: "HTML".into(),
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        match Self::parse::<Message>(response).await {
            Ok(_) => {
                debug!("Sent message to chat {}", chat_id);
                Ok(())
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                Err(TelegramError::SendFailed(e.to_string()))
            }
        }
    }

    /// Reply into the chat a message came from.
    pub async fn reply(&self, original: &BotMessage, html: &str) -> Result<(), TelegramError> {
        self.send_message(original.chat_id, html).await
    }
}
