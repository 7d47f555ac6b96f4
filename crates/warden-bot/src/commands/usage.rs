//! Usage command - the caller's accumulated traffic.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::format::format_traffic;
use async_trait::async_trait;
use relay_ledger::ReconciliationEngine;
use std::sync::Arc;
use telegram_client::BotMessage;

pub struct UsageHandler {
    engine: Arc<ReconciliationEngine>,
}

impl UsageHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for UsageHandler {
    fn trigger(&self) -> &str {
        "usage"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let identity = self.engine.usage(message.user_id).await?;
        Ok(format!("<b>Your traffic</b>\n{}", format_traffic(&identity.traffic)))
    }
}
