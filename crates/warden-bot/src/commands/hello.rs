//! Hello command - shows the caller's id and admin flag.

use crate::commands::{Admins, CommandHandler};
use crate::error::AppResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

pub struct HelloHandler {
    admins: Admins,
}

impl HelloHandler {
    pub fn new(admins: Admins) -> Self {
        Self { admins }
    }
}

#[async_trait]
impl CommandHandler for HelloHandler {
    fn trigger(&self) -> &str {
        "hello"
    }

    fn matches(&self, message: &BotMessage) -> bool {
        matches!(message.command(), Some("hello") | Some("start"))
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        Ok(format!(
            "Hello!\nYour ID: <code>{}</code>\nAdministration: <b>{}</b>",
            message.user_id,
            self.admins.contains(&message.user_id)
        ))
    }
}
