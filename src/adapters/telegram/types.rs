//! Telegram Bot API 的線路格式，只保留本服務用得到的欄位。

use crate::domain::model::{InboundEvent, Sender};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
}

impl From<User> for Sender {
    fn from(user: User) -> Self {
        Sender {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    /// `/cmd@bot_name` 中的 bot_name
    pub mention: Option<String>,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// 沒有指名，或指名的就是本 bot（不分大小寫）
    pub fn is_addressed_to(&self, bot_username: Option<&str>) -> bool {
        match (self.mention.as_deref(), bot_username) {
            (Some(mention), Some(bot)) => mention.eq_ignore_ascii_case(bot.trim_start_matches('@')),
            _ => true,
        }
    }
}

/// 拆出指令名稱、指名的 bot 與參數：`/add_wl@voltic_bot @a @b`
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention.to_string())),
        None => (head, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name: name.to_string(),
        mention,
        args: parts.map(str::to_string).collect(),
    })
}

impl Update {
    /// 指名其他 bot 的指令回傳 None
    pub fn into_event(self, bot_username: Option<&str>) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            return Some(InboundEvent::Callback {
                callback_id: query.id,
                chat_id,
                sender: query.from.into(),
                data: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let sender: Sender = message.from?.into();
        let chat_id = message.chat.id;

        if let Some(document) = message.document {
            return Some(InboundEvent::Document {
                chat_id,
                sender,
                file_id: document.file_id,
                file_name: document.file_name,
            });
        }

        let text = message.text?;
        match parse_command(&text) {
            Some(command) if !command.is_addressed_to(bot_username) => {
                tracing::debug!(
                    "Ignoring /{} addressed to @{}",
                    command.name,
                    command.mention.as_deref().unwrap_or_default()
                );
                None
            }
            Some(command) => Some(InboundEvent::Command {
                chat_id,
                sender,
                name: command.name,
                args: command.args,
            }),
            None => Some(InboundEvent::Text {
                chat_id,
                sender,
                text,
            }),
        }
    }
}
