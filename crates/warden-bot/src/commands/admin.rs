//! Admin commands - tokens, user management and traffic statistics.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::format::{escape_html, format_traffic};
use async_trait::async_trait;
use relay_ledger::{LedgerError, ReconciliationEngine, RegistrationAuthority};
use std::fmt::Write;
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::info;

pub struct TokenHandler {
    authority: Arc<RegistrationAuthority>,
}

impl TokenHandler {
    pub fn new(authority: Arc<RegistrationAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl CommandHandler for TokenHandler {
    fn trigger(&self) -> &str {
        "token"
    }

    fn admin_only(&self) -> bool {
        true
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let token = self.authority.gen_token().await;
        info!("Admin {} created a registration token", message.user_id);
        Ok(format!(
            "token: <code>{}</code>\nThe new user sends <code>/register {}</code> to me.",
            token, token
        ))
    }
}

pub struct UsersHandler {
    engine: Arc<ReconciliationEngine>,
}

impl UsersHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for UsersHandler {
    fn trigger(&self) -> &str {
        "users"
    }

    fn admin_only(&self) -> bool {
        true
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
        let identities = self.engine.identities().await?;
        if identities.is_empty() {
            return Ok("No users registered.".into());
        }

        let mut msg = String::from("<b>Users:</b>\n");
        for identity in &identities {
            let _ = writeln!(
                msg,
                "{}: <code>{}</code> ({} link(s))",
                escape_html(&identity.name),
                identity.external_id,
                identity.credential_ids.len()
            );
        }
        Ok(msg)
    }
}

pub struct DeleteUserHandler {
    engine: Arc<ReconciliationEngine>,
}

impl DeleteUserHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for DeleteUserHandler {
    fn trigger(&self) -> &str {
        "deluser"
    }

    fn admin_only(&self) -> bool {
        true
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let Ok(external_id) = message.args().parse::<i64>() else {
            return Ok("Usage: /deluser &lt;user id&gt;".into());
        };

        match self.engine.delete_identity(external_id).await {
            Ok(identity) => {
                info!("Admin {} deleted user {}", message.user_id, external_id);
                Ok(format!(
                    "Deleted {} (<code>{}</code>).",
                    escape_html(&identity.name),
                    external_id
                ))
            }
            Err(LedgerError::NotRegistered(_)) => {
                Ok(format!("No user with id <code>{}</code>.", external_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub struct TrafficHandler {
    engine: Arc<ReconciliationEngine>,
}

impl TrafficHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for TrafficHandler {
    fn trigger(&self) -> &str {
        "traffic"
    }

    fn admin_only(&self) -> bool {
        true
    }

    fn private_only(&self) -> bool {
        true
    }

    async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
        let mut inbounds = self.engine.inbound_traffic().await?;
        inbounds.sort_by(|a, b| b.traffic.downlink.cmp(&a.traffic.downlink));

        self.engine.reconcile().await?;
        let users = self.engine.leaderboard().await?;

        let mut msg = String::from("<b><u>Inbound traffic sorted by downlink</u></b>\n");
        for inbound in &inbounds {
            let _ = writeln!(
                msg,
                "{} {}",
                escape_html(&inbound.tag),
                format_traffic(&inbound.traffic)
            );
        }

        msg.push_str("\n<b><u>User traffic sorted by downlink</u></b>\n");
        for identity in &users {
            let _ = writeln!(
                msg,
                "{} {}",
                escape_html(&identity.name),
                format_traffic(&identity.traffic)
            );
        }
        Ok(msg)
    }
}
