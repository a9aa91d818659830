//! 指令、文字、文件與按鈕回呼的處理函式。
//!
//! 每個處理函式都拿到同一個 [`BotContext`]，自行決定權限與回覆內容；
//! 回傳的錯誤由 dispatcher 統一記錄。

pub mod admin;
pub mod callback;
pub mod knowledge;
pub mod user;

use crate::core::assistant::AiAssistant;
use crate::core::keyboard;
use crate::core::rag_system::RagComponents;
use crate::core::session::SessionStore;
use crate::domain::model::{ChatId, Reply, SentMessage, UserId};
use crate::domain::ports::{Messenger, UserStore};
use crate::utils::error::Result;
use std::sync::Arc;

pub const NO_ADMIN_RIGHTS: &str = "❌ У вас нет прав администратора.";

/// 處理更新時共用的依賴
#[derive(Clone)]
pub struct BotContext {
    pub messenger: Arc<dyn Messenger>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionStore,
    /// AI 停用時為 None
    pub assistant: Option<Arc<AiAssistant>>,
    /// 知識庫未初始化時為 None
    pub rag: Option<RagComponents>,
    pub admin_ids: Vec<UserId>,
    pub welcome_photo_id: String,
}

impl BotContext {
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id)
    }

    pub async fn is_registered(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.find_user(user_id).await?.is_some())
    }

    pub async fn reply(&self, chat_id: ChatId, reply: Reply) -> Result<SentMessage> {
        self.messenger.send_message(chat_id, &reply).await
    }

    pub async fn reply_text(&self, chat_id: ChatId, text: impl Into<String>) -> Result<SentMessage> {
        self.reply(chat_id, Reply::text(text)).await
    }

    /// 回覆文字並附上註冊／說明按鈕
    pub async fn reply_with_auth(&self, chat_id: ChatId, text: &str) -> Result<SentMessage> {
        self.reply(chat_id, Reply::text(text).keyboard(keyboard::auth_keyboard()))
            .await
    }
}
