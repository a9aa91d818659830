//! Telegram Bot API 用戶端（HTTPS + JSON）。

pub mod poller;
pub mod types;

use crate::domain::model::{ChatId, Reply, SentMessage};
use crate::domain::ports::Messenger;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use types::{ApiResponse, File, Message, Update, User};

pub use poller::LongPoller;

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// `poll_timeout` 用來推算 HTTP 逾時，必須比 long polling 的等待時間長
    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        tracing::debug!("📡 Telegram {}", method);
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;

        let body: ApiResponse<T> = response.json().await?;
        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::TelegramError {
                code: body.error_code,
                description: body
                    .description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            }),
        }
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let mut payload = json!({ "timeout": timeout.as_secs() });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call("getUpdates", &payload).await
    }

    /// bot 本身的帳號，用來辨識群組中指名的指令
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// 啟動時丟棄離線期間累積的更新
    pub async fn drop_pending_updates(&self) -> Result<()> {
        let _: bool = self
            .call("deleteWebhook", &json!({ "drop_pending_updates": true }))
            .await?;
        Ok(())
    }

    fn reply_payload(chat_id: ChatId, text_field: &str, reply: &Reply) -> Value {
        let mut payload = json!({ "chat_id": chat_id });
        payload[text_field] = json!(reply.text);
        if reply.parse_mode.is_some() {
            payload["parse_mode"] = json!("Markdown");
        }
        if let Some(keyboard) = &reply.keyboard {
            payload["reply_markup"] = json!(keyboard);
        }
        payload
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: ChatId, reply: &Reply) -> Result<SentMessage> {
        let payload = Self::reply_payload(chat_id, "text", reply);
        let message: Message = self.call("sendMessage", &payload).await?;
        Ok(SentMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn send_photo(&self, chat_id: ChatId, photo: &str, reply: &Reply) -> Result<SentMessage> {
        let mut payload = Self::reply_payload(chat_id, "caption", reply);
        payload["photo"] = json!(photo);
        let message: Message = self.call("sendPhoto", &payload).await?;
        Ok(SentMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_message(&self, message: &SentMessage, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        let _: Value = self.call("editMessageText", &payload).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        let _: bool = self
            .call("sendChatAction", &json!({ "chat_id": chat_id, "action": "typing" }))
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: File = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let file_path = file.file_path.ok_or_else(|| BotError::TelegramError {
            code: None,
            description: format!("file {} has no download path", file.file_id),
        })?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tracing::debug!("📥 Downloaded {} ({} bytes)", file_path, bytes.len());
        Ok(bytes.to_vec())
    }
}
