//! Register command - redeems a registration token.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::format::escape_html;
use async_trait::async_trait;
use relay_ledger::RegistrationAuthority;
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::info;

pub struct RegisterHandler {
    authority: Arc<RegistrationAuthority>,
}

impl RegisterHandler {
    pub fn new(authority: Arc<RegistrationAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl CommandHandler for RegisterHandler {
    fn trigger(&self) -> &str {
        "register"
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let token = message.args();
        if token.is_empty() {
            return Ok("Usage: /register &lt;token&gt;".into());
        }

        let identity = self
            .authority
            .register(token, message.user_id, &message.display_name)
            .await?;
        info!("Registered user {} as identity {}", message.user_id, identity.id);

        Ok(format!(
            "Welcome, {}! Send /proxy to get your connection link.",
            escape_html(&identity.name)
        ))
    }
}
