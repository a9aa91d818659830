use crate::adapters::postgres::PgKnowledgeStore;
use crate::config::RagConfig;
use crate::core::assistant::AiAssistant;
use crate::core::embedding::EmbeddingService;
use crate::core::rag_engine::RagEngine;
use crate::core::text_splitter::RecursiveTextSplitter;
use crate::core::uploader::DocumentUploader;
use crate::domain::ports::{Embedder, KnowledgeStore};
use crate::utils::error::Result;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use std::sync::Arc;

/// 啟用中的知識庫元件；初始化失敗時整個行程都不會有這組元件
#[derive(Clone)]
pub struct RagComponents {
    pub engine: Arc<RagEngine>,
    pub uploader: Arc<DocumentUploader>,
    pub store: Arc<dyn KnowledgeStore>,
}

impl RagComponents {
    /// 在已連線的知識庫上組裝引擎與上傳器，並記錄目前的統計
    pub async fn assemble(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn Embedder>,
        assistant: Arc<AiAssistant>,
        rag: &RagConfig,
    ) -> Result<Self> {
        let embeddings = EmbeddingService::new(embedder);
        tracing::info!("✅ Embedding service initialized ({})", rag.embedding_model());

        let uploader = DocumentUploader::new(
            store.clone(),
            embeddings.clone(),
            RecursiveTextSplitter::new(rag.chunk_size(), rag.chunk_overlap()),
        );
        tracing::info!("✅ Document uploader initialized");

        let engine = RagEngine::new(
            store.clone(),
            embeddings,
            assistant,
            rag.similarity_threshold(),
            rag.search_limit(),
        );
        tracing::info!("✅ RAG engine initialized");

        let stats = engine.get_stats().await?;
        tracing::info!(
            "📊 RAG stats: documents={}, chunks={}",
            stats.documents_count,
            stats.chunks_count
        );

        Ok(Self {
            engine: Arc::new(engine),
            uploader: Arc::new(uploader),
            store,
        })
    }

    pub async fn close(&self) {
        self.store.close().await;
        tracing::info!("✅ RAG connections closed");
    }
}

/// 以指數退避連線知識庫；任何失敗都只會停用 RAG，不影響 bot 啟動
pub async fn init_rag_system(
    rag: &RagConfig,
    embedder: Arc<dyn Embedder>,
    assistant: Arc<AiAssistant>,
) -> Option<RagComponents> {
    let policy = RetryPolicy::new(rag.connect_attempts(), rag.retry_delay());
    let (min, max) = rag.pool_size();

    let connected = retry_with_backoff(policy, "RAG database connection", || {
        PgKnowledgeStore::connect(&rag.database_url, min, max)
    })
    .await;

    let store: Arc<dyn KnowledgeStore> = match connected {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("❌ RAG initialization failed: {}", e);
            return None;
        }
    };
    tracing::info!("✅ RAG database connected");

    match RagComponents::assemble(store.clone(), embedder, assistant, rag).await {
        Ok(components) => Some(components),
        Err(e) => {
            tracing::error!("❌ RAG initialization failed: {}", e);
            store.close().await;
            None
        }
    }
}
