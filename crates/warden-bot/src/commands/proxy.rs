//! Proxy commands - connection links and rotation.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use async_trait::async_trait;
use relay_ledger::{IssuedCredential, ReconciliationEngine};
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::info;

/// Link first so it can be copied with one tap, manual settings below.
fn render_credentials(issued: &[IssuedCredential]) -> String {
    issued
        .iter()
        .map(|c| format!("<code>{}</code>\n\n{}", c.link, c.settings))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct ProxyHandler {
    engine: Arc<ReconciliationEngine>,
}

impl ProxyHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for ProxyHandler {
    fn trigger(&self) -> &str {
        "proxy"
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let issued = self.engine.credentials(message.user_id).await?;
        Ok(format!("<b>Your proxy</b>\n\n{}", render_credentials(&issued)))
    }
}

pub struct RotateHandler {
    engine: Arc<ReconciliationEngine>,
}

impl RotateHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for RotateHandler {
    fn trigger(&self) -> &str {
        "rotate"
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        // Old credentials stop resolving once rotated; settle their counters first.
        self.engine.reconcile().await?;
        let issued = self.engine.rotate(message.user_id).await?;
        info!("User {} rotated to credential {}", message.user_id, issued.credential_id);

        Ok(format!(
            "Your proxy has been updated. Previous links no longer work.\n\n{}",
            render_credentials(std::slice::from_ref(&issued))
        ))
    }
}
