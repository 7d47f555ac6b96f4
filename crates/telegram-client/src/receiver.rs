//! Update receiver with long polling.

use crate::client::TelegramClient;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

/// Turns `getUpdates` long polling into a stream of bot messages.
pub struct UpdateReceiver {
    client: TelegramClient,
    offset: i64,
    error_backoff: Duration,
}

impl UpdateReceiver {
    pub fn new(client: TelegramClient) -> Self {
        Self {
            client,
            offset: 0,
            error_backoff: Duration::from_secs(5),
        }
    }

    /// Override the pause after a failed poll.
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Start receiving messages as an async stream.
    ///
    /// Every update is acknowledged by advancing the offset, including ones
    /// that carry nothing for the bot.
    pub fn stream(mut self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            loop {
                match self.client.get_updates(self.offset).await {
                    Ok(updates) => {
                        for update in updates {
                            self.offset = self.offset.max(update.update_id + 1);
                            if let Some(bot_msg) = BotMessage::from_update(&update) {
                                debug!("Received: {} from {}",
                                    bot_msg.text.chars().take(50).collect::<String>(),
                                    bot_msg.user_id
                                );
                                yield bot_msg;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        sleep(self.error_backoff).await;
                    }
                }
            }
        }
    }
}
