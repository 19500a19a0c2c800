use std::{sync::Arc, time::Duration};

use super::client::TelegramClient;
use crate::bot::Bot;

/// Seconds Telegram holds a `getUpdates` request open
const POLL_TIMEOUT_SECS: u64 = 25;
/// Pause after a failed poll before trying again
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fetch updates forever and feed them to the bot one at a time
pub async fn run_polling(client: Arc<TelegramClient>, bot: Arc<Bot>) {
    if let Err(e) = client.delete_webhook().await {
        tracing::warn!("Failed to delete webhook before polling: {}", e);
    }
    tracing::info!("Long polling for updates");

    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(event) = update.into_event() else {
                continue;
            };
            if let Err(e) = bot.handle(event).await {
                tracing::error!("Failed to handle update: {:#}", e);
            }
        }
    }
}
