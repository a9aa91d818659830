use crate::core::assistant::{AiAssistant, PromptMode};
use crate::core::embedding::EmbeddingService;
use crate::domain::model::{ChatMessage, ChunkMatch, KnowledgeStats, RagAnswer, UsageRecord, UserId};
use crate::domain::ports::KnowledgeStore;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;

/// 放進上下文的每個片段最多保留的字元數
pub const CONTEXT_CHUNK_CHARS: usize = 500;
pub const STATUS_ACTIVE: &str = "active";

/// 檢索增強：嵌入問題、找相近片段、組上下文後交給助理回答
pub struct RagEngine {
    store: Arc<dyn KnowledgeStore>,
    embeddings: EmbeddingService,
    assistant: Arc<AiAssistant>,
    similarity_threshold: f64,
    search_limit: i64,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embeddings: EmbeddingService,
        assistant: Arc<AiAssistant>,
        similarity_threshold: f64,
        search_limit: i64,
    ) -> Self {
        Self {
            store,
            embeddings,
            assistant,
            similarity_threshold,
            search_limit,
        }
    }

    /// 沒有可用的知識庫答案時回傳 None，由呼叫端改用一般對話
    pub async fn process_query(&self, query: &str, user_id: UserId, history: &[ChatMessage]) -> Option<RagAnswer> {
        match self.try_process_query(query, user_id, history).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("❌ RAG query failed for user {}: {}", user_id, e);
                None
            }
        }
    }

    async fn try_process_query(
        &self,
        query: &str,
        user_id: UserId,
        history: &[ChatMessage],
    ) -> Result<Option<RagAnswer>> {
        let started = Instant::now();

        let Some(query_embedding) = self.embeddings.create_embedding(query).await else {
            tracing::warn!("⚠️ Could not embed query, skipping knowledge base");
            return Ok(None);
        };

        let chunks = self.store.search_chunks(&query_embedding, self.search_limit).await?;
        let relevant: Vec<ChunkMatch> = chunks
            .into_iter()
            .filter(|chunk| chunk.similarity >= self.similarity_threshold)
            .collect();

        if relevant.is_empty() {
            tracing::info!("No relevant chunks above {:.2}, falling back to plain AI", self.similarity_threshold);
            return Ok(None);
        }

        let context = build_context(&relevant);
        let prompt = build_prompt(query, &context);
        let response = self
            .assistant
            .get_response(&prompt, user_id, history, PromptMode::Rag)
            .await;
        let response = clean_response(&response);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.store
            .log_usage(&UsageRecord {
                user_id,
                query: query.to_string(),
                chunks_used: relevant.len() as i32,
                response_time_ms: elapsed_ms.min(i32::MAX as u64) as i32,
            })
            .await?;

        tracing::info!(
            "📚 RAG answered user {} with {} chunks in {} ms",
            user_id,
            relevant.len(),
            elapsed_ms
        );

        Ok(Some(RagAnswer {
            response,
            chunks_used: relevant.len(),
            response_time_ms: elapsed_ms,
            chunks: relevant,
        }))
    }

    pub async fn get_stats(&self) -> Result<KnowledgeStats> {
        self.store.stats().await
    }
}

pub fn build_context(chunks: &[ChunkMatch]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let content = match chunk.content.char_indices().nth(CONTEXT_CHUNK_CHARS) {
                Some((idx, _)) => format!("{}...", &chunk.content[..idx]),
                None => chunk.content.clone(),
            };
            format!(
                "[Источник: {}, релевантность: {:.2}]:\n{}",
                chunk.filename, chunk.similarity, content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Use this information from the knowledge base to answer the question:\n\n\
         INFORMATION FROM THE KNOWLEDGE BASE:\n{}\n\n\
         USER QUESTION:\n{}\n",
        context, query
    )
}

/// 移除模型可能照抄的來源標記
pub fn clean_response(response: &str) -> String {
    response
        .replace("[Источник:", "")
        .replace("релевантность:", "")
        .trim()
        .to_string()
}
