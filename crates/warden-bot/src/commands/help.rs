//! Help command - displays available commands.

use crate::commands::{Admins, CommandHandler};
use crate::error::AppResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

const USER_HELP: &str = "<b>Relay Warden</b>

<b>Commands:</b>
/hello - Show your user id
/register &lt;token&gt; - Register with a token from an admin
/proxy - Get your connection link
/rotate - Replace your link with a new one
/usage - Show your traffic
/help - Show this message";

const ADMIN_HELP: &str = "

<b>Admin:</b>
/token - Create a registration token
/users - List registered users
/deluser &lt;user id&gt; - Delete a user and revoke their links
/traffic - Inbound and per-user traffic";

pub struct HelpHandler {
    admins: Admins,
}

impl HelpHandler {
    pub fn new(admins: Admins) -> Self {
        Self { admins }
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn trigger(&self) -> &str {
        "help"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        if self.admins.contains(&message.user_id) {
            Ok(format!("{}{}", USER_HELP, ADMIN_HELP))
        } else {
            Ok(USER_HELP.into())
        }
    }
}
