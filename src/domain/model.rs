use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ChatId = i64;

/// 去掉開頭的 `@`、轉小寫並去除空白；空字串代表沒有 username
pub fn normalize_username(username: Option<&str>) -> String {
    let Some(raw) = username else {
        return String::new();
    };
    let raw = raw.strip_prefix('@').unwrap_or(raw);
    raw.to_lowercase().trim().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredUser {
    pub telegram_id: UserId,
    pub user_name: String,
    pub registered_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    MissingUsername,
    NotWhiteListed,
    AlreadyRegistered,
    /// 儲存層失敗；細節只寫進 log
    InternalError,
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered)
    }

    pub fn message(&self) -> &'static str {
        match self {
            RegistrationOutcome::Registered => {
                "✅ Вы успешно зарегистрированы! Теперь давай начнем работу! Задавай мне вопросы и я обязательно отвечу на них!"
            }
            RegistrationOutcome::MissingUsername => "❌ Установите username в Telegram",
            RegistrationOutcome::NotWhiteListed => {
                "❌ У вас нет доступа к боту.\nОбратитесь к администратору для добавления в white list."
            }
            RegistrationOutcome::AlreadyRegistered => "Вы уже зарегистрированы!",
            RegistrationOutcome::InternalError => "❌ Произошла внутренняя ошибка.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeDocument {
    pub id: i32,
    pub filename: String,
    pub total_chunks: i32,
    pub uploaded_by: UserId,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub document_id: i32,
    pub chunk_index: i32,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMatch {
    pub id: i32,
    pub content: String,
    pub metadata: serde_json::Value,
    pub filename: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub user_id: UserId,
    pub query: String,
    pub chunks_used: i32,
    pub response_time_ms: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeStats {
    pub documents_count: i64,
    pub chunks_count: i64,
    pub queries_today: i64,
    pub total_queries: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    pub response: String,
    pub chunks_used: usize,
    pub response_time_ms: u64,
    pub chunks: Vec<ChunkMatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub document_id: i32,
    pub filename: String,
    pub chunks_created: usize,
    pub total_text_length: usize,
}

// ----- Messenger 相關 -----

#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
}

/// 從 Telegram 更新轉換而來、與傳輸無關的事件
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Command {
        chat_id: ChatId,
        sender: Sender,
        name: String,
        args: Vec<String>,
    },
    Text {
        chat_id: ChatId,
        sender: Sender,
        text: String,
    },
    Document {
        chat_id: ChatId,
        sender: Sender,
        file_id: String,
        file_name: Option<String>,
    },
    Callback {
        callback_id: String,
        chat_id: ChatId,
        sender: Sender,
        data: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Command { sender, .. }
            | InboundEvent::Text { sender, .. }
            | InboundEvent::Document { sender, .. }
            | InboundEvent::Callback { sender, .. } => sender,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
            keyboard: None,
        }
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Markdown);
        self
    }

    pub fn keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username(Some("@Ivanov")), "ivanov");
        assert_eq!(normalize_username(Some("Petrov ")), "petrov");
        assert_eq!(normalize_username(Some("@")), "");
        assert_eq!(normalize_username(None), "");
    }

    #[test]
    fn test_only_first_at_is_stripped() {
        assert_eq!(normalize_username(Some("@@odd")), "@odd");
    }

    #[test]
    fn test_chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
