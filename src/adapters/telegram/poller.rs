use super::TelegramClient;
use crate::domain::model::InboundEvent;
use crate::domain::ports::UpdateSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// getUpdates long polling，自行追蹤 offset
pub struct LongPoller {
    client: TelegramClient,
    timeout: Duration,
    offset: Option<i64>,
    bot_username: Option<String>,
}

impl LongPoller {
    pub fn new(client: TelegramClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            offset: None,
            bot_username: None,
        }
    }

    /// 群組中 `/cmd@其他bot` 的指令會被略過
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }
}

#[async_trait]
impl UpdateSource for LongPoller {
    async fn next_batch(&mut self) -> Result<Vec<InboundEvent>> {
        let updates = self.client.get_updates(self.offset, self.timeout).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(last + 1);
        }

        let total = updates.len();
        let bot_username = self.bot_username.as_deref();
        let events: Vec<InboundEvent> = updates
            .into_iter()
            .filter_map(|u| u.into_event(bot_username))
            .collect();
        if events.len() < total {
            tracing::debug!("Skipped {} unsupported updates", total - events.len());
        }
        Ok(events)
    }
}
