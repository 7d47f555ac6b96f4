//! Bot command handlers.

mod admin;
mod hello;
mod help;
mod proxy;
mod register;
mod usage;

pub use admin::{DeleteUserHandler, TokenHandler, TrafficHandler, UsersHandler};
pub use hello::HelloHandler;
pub use help::HelpHandler;
pub use proxy::{ProxyHandler, RotateHandler};
pub use register::RegisterHandler;
pub use usage::UsageHandler;

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use relay_ledger::{LedgerError, ReconciliationEngine, RegistrationAuthority};
use std::collections::HashSet;
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::{debug, error, warn};

/// Telegram user ids with admin rights.
pub type Admins = Arc<HashSet<i64>>;

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name without the leading slash (e.g., "proxy").
    fn trigger(&self) -> &str;

    /// Restricted to configured admins.
    fn admin_only(&self) -> bool {
        false
    }

    /// Only accepted in a private chat with the bot.
    fn private_only(&self) -> bool {
        false
    }

    /// Check if this handler matches the message.
    fn matches(&self, message: &BotMessage) -> bool {
        message.command() == Some(self.trigger())
    }

    /// Execute the command.
    async fn execute(&self, message: &BotMessage) -> AppResult<String>;
}

/// Routes messages to handlers and turns failures into user-facing replies.
pub struct Dispatcher {
    handlers: Vec<Box<dyn CommandHandler>>,
    admins: Admins,
}

impl Dispatcher {
    pub fn new(handlers: Vec<Box<dyn CommandHandler>>, admins: Admins) -> Self {
        Self { handlers, admins }
    }

    /// Every command the bot understands.
    pub fn standard(
        engine: Arc<ReconciliationEngine>,
        authority: Arc<RegistrationAuthority>,
        admins: Admins,
    ) -> Self {
        let handlers: Vec<Box<dyn CommandHandler>> = vec![
            Box::new(HelloHandler::new(admins.clone())),
            Box::new(HelpHandler::new(admins.clone())),
            Box::new(RegisterHandler::new(authority.clone())),
            Box::new(ProxyHandler::new(engine.clone())),
            Box::new(RotateHandler::new(engine.clone())),
            Box::new(UsageHandler::new(engine.clone())),
            Box::new(TokenHandler::new(authority)),
            Box::new(UsersHandler::new(engine.clone())),
            Box::new(DeleteUserHandler::new(engine.clone())),
            Box::new(TrafficHandler::new(engine)),
        ];
        Self::new(handlers, admins)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Reply for a message, or `None` when no handler wants it.
    pub async fn dispatch(&self, message: &BotMessage) -> Option<String> {
        let handler = self.handlers.iter().find(|h| h.matches(message))?;

        if handler.admin_only() && !self.admins.contains(&message.user_id) {
            warn!("User {} tried admin command /{}", message.user_id, handler.trigger());
            return Some("This command is for admins only.".into());
        }
        if handler.private_only() && !message.is_private {
            return Some("Please send this command in a private chat with me.".into());
        }

        debug!("User {} -> /{}", message.user_id, handler.trigger());
        match handler.execute(message).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!("Handler /{} failed: {}", handler.trigger(), e);
                Some(user_message(&e))
            }
        }
    }
}

/// Short explanation of an error, safe to show to the user.
pub fn user_message(error: &AppError) -> String {
    match error {
        AppError::Ledger(LedgerError::NotRegistered(_)) => {
            "You are not registered yet. Ask an admin for a token and send /register &lt;token&gt;."
                .into()
        }
        AppError::Ledger(LedgerError::InvalidToken) => "That token is invalid or already used.".into(),
        AppError::Ledger(LedgerError::AlreadyRegistered(_)) => "You are already registered.".into(),
        AppError::Ledger(LedgerError::StoreConflict(_)) => {
            "Your account is busy, please try again.".into()
        }
        AppError::Ledger(e) if e.is_relay_failure() => {
            "The relay is not reachable right now, please try again later.".into()
        }
        AppError::Relay(_) => "The relay is not reachable right now, please try again later.".into(),
        _ => "Sorry, something went wrong.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler {
        admin_only: bool,
        private_only: bool,
    }

    #[async_trait]
    impl CommandHandler for EchoHandler {
        fn trigger(&self) -> &str {
            "echo"
        }

        fn admin_only(&self) -> bool {
            self.admin_only
        }

        fn private_only(&self) -> bool {
            self.private_only
        }

        async fn execute(&self, message: &BotMessage) -> AppResult<String> {
            if message.args() == "fail" {
                return Err(LedgerError::InvalidToken.into());
            }
            Ok(format!("echo {}", message.args()))
        }
    }

    fn message(user_id: i64, text: &str, is_private: bool) -> BotMessage {
        BotMessage {
            user_id,
            chat_id: user_id,
            text: text.into(),
            is_private,
            display_name: "tester".into(),
        }
    }

    fn dispatcher(admin_only: bool, private_only: bool) -> Dispatcher {
        Dispatcher::new(
            vec![Box::new(EchoHandler {
                admin_only,
                private_only,
            })],
            Arc::new(HashSet::from([1])),
        )
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_command() {
        let d = dispatcher(false, false);
        assert_eq!(d.dispatch(&message(2, "/echo hi", false)).await.unwrap(), "echo hi");
        assert!(d.dispatch(&message(2, "/other", true)).await.is_none());
        assert!(d.dispatch(&message(2, "echo", true)).await.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_enforces_admin_and_private() {
        let admin = dispatcher(true, false);
        assert_eq!(
            admin.dispatch(&message(2, "/echo", true)).await.unwrap(),
            "This command is for admins only."
        );
        assert_eq!(admin.dispatch(&message(1, "/echo x", true)).await.unwrap(), "echo x");

        let private = dispatcher(false, true);
        assert!(private
            .dispatch(&message(2, "/echo", false))
            .await
            .unwrap()
            .contains("private chat"));
    }

    #[tokio::test]
    async fn test_dispatch_maps_errors() {
        let d = dispatcher(false, false);
        assert_eq!(
            d.dispatch(&message(2, "/echo fail", true)).await.unwrap(),
            "That token is invalid or already used."
        );
    }

    #[test]
    fn test_user_message_for_relay_failures() {
        let unavailable = AppError::Ledger(LedgerError::RelayUnavailable("down".into()));
        assert!(user_message(&unavailable).contains("relay is not reachable"));

        let rejected = AppError::Ledger(LedgerError::RelayRejected("409".into()));
        assert!(user_message(&rejected).contains("relay is not reachable"));

        let missing = AppError::Ledger(LedgerError::MissingCredential("c1".into()));
        assert_eq!(user_message(&missing), "Sorry, something went wrong.");
    }
}
