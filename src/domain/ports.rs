use crate::domain::model::{
    ChatId, ChatMessage, ChunkMatch, Completion, CompletionParams, InboundEvent,
    KnowledgeDocument, KnowledgeStats, NewChunk, RegisteredUser, RegistrationOutcome, Reply,
    SentMessage, UsageRecord, UserId,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 註冊使用者與 white list。username 參數皆為已正規化的值。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, telegram_id: UserId) -> Result<Option<RegisteredUser>>;
    /// 在同一個交易內檢查 white list 並寫入
    async fn register_user(&self, telegram_id: UserId, username: &str) -> Result<RegistrationOutcome>;
    async fn delete_user(&self, telegram_id: UserId) -> Result<bool>;
    async fn is_white_listed(&self, username: &str) -> Result<bool>;
    /// 最新加入的排在前面
    async fn white_list(&self) -> Result<Vec<String>>;
    async fn add_to_white_list(&self, username: &str) -> Result<()>;
    async fn remove_from_white_list(&self, username: &str) -> Result<bool>;
    async fn close(&self);
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn document_exists(&self, file_hash: &str) -> Result<bool>;
    async fn add_document(&self, filename: &str, file_hash: &str, uploaded_by: UserId) -> Result<i32>;
    async fn add_chunk(&self, chunk: &NewChunk) -> Result<()>;
    async fn set_chunk_count(&self, document_id: i32, total_chunks: i32) -> Result<()>;
    /// 依 cosine 距離排序，similarity = 1 - distance
    async fn search_chunks(&self, embedding: &[f32], limit: i64) -> Result<Vec<ChunkMatch>>;
    async fn log_usage(&self, usage: &UsageRecord) -> Result<()>;
    async fn stats(&self) -> Result<KnowledgeStats>;
    async fn documents(&self) -> Result<Vec<KnowledgeDocument>>;
    async fn delete_document(&self, document_id: i32) -> Result<bool>;
    async fn close(&self);
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage], params: CompletionParams) -> Result<Completion>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, input: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, reply: &Reply) -> Result<SentMessage>;
    /// `reply.text` 作為圖片說明
    async fn send_photo(&self, chat_id: ChatId, photo: &str, reply: &Reply) -> Result<SentMessage>;
    async fn edit_message(&self, message: &SentMessage, text: &str) -> Result<()>;
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
    async fn send_typing(&self, chat_id: ChatId) -> Result<()>;
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait UpdateSource: Send {
    /// 取得下一批事件；無法辨識的更新直接略過
    async fn next_batch(&mut self) -> Result<Vec<InboundEvent>>;
}
