use crate::domain::ports::Embedder;
use std::sync::Arc;

/// 超過此長度的輸入會被截斷（以字元計）
pub const MAX_EMBEDDING_INPUT_CHARS: usize = 8000;

/// 包裝 Embedder：截斷輸入，失敗時記錄並回傳 None
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub async fn create_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let input = truncate_chars(text, MAX_EMBEDDING_INPUT_CHARS);
        match self.embedder.embed(input).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::error!("❌ Embedding request failed: {}", e);
                None
            }
        }
    }
}

/// 依字元邊界截斷，不會切到 UTF-8 多位元組字元中間
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
