//! Bot API types.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Outgoing message request.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: String,
    pub disable_web_page_preview: bool,
}

/// Parsed message for bot processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotMessage {
    /// Telegram user id of the sender.
    pub user_id: i64,
    /// Chat to reply into.
    pub chat_id: i64,
    pub text: String,
    /// Whether this is a one-to-one chat with the bot.
    pub is_private: bool,
    pub display_name: String,
}

impl BotMessage {
    /// Extract a text message from an update. Non-text updates, messages
    /// without a sender and messages from other bots yield `None`.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let from = message.from.as_ref().filter(|u| !u.is_bot)?;
        let text = message.text.as_ref()?.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            user_id: from.id,
            chat_id: message.chat.id,
            text: text.to_string(),
            is_private: message.chat.kind == "private",
            display_name: from.display_name(),
        })
    }

    /// The `/command` word, without any `@botname` suffix, if the text is a command.
    pub fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        let command = first.strip_prefix('/')?;
        Some(command.split('@').next().unwrap_or(command))
    }

    /// Text after the command word, trimmed.
    pub fn args(&self) -> &str {
        match self.text.split_once(char::is_whitespace) {
            Some((_, rest)) if self.command().is_some() => rest.trim(),
            _ => "",
        }
    }
}
