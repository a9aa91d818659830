use crate::core::embedding::EmbeddingService;
use crate::core::extract::{self, DocumentKind};
use crate::core::text_splitter::RecursiveTextSplitter;
use crate::domain::model::{KnowledgeDocument, NewChunk, UploadReport, UserId};
use crate::domain::ports::KnowledgeStore;
use crate::utils::error::BotError;
use md5::{Digest, Md5};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// 抽出的文字少於此字元數（trim 後）視為空檔
pub const MIN_TEXT_CHARS: usize = 10;

/// 上傳被拒的原因；Display 即為回給使用者的訊息
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Неподдерживаемый формат файла: .{extension}. Используйте PDF, TXT, MD или DOCX.")]
    Unsupported { extension: String },

    #[error("Этот документ уже загружен")]
    Duplicate,

    #[error("Не удалось извлечь текст из PDF (файл пустой или защищён)")]
    EmptyPdf,

    #[error("Не удалось прочитать текст из файла")]
    EmptyText,

    #[error("Не удалось извлечь текст из DOCX (файл пустой или повреждён)")]
    EmptyDocx,

    #[error("Не удалось разбить документ на части")]
    NoChunks,

    #[error("{0}")]
    Internal(#[from] BotError),
}

pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

pub struct DocumentUploader {
    store: Arc<dyn KnowledgeStore>,
    embeddings: EmbeddingService,
    splitter: RecursiveTextSplitter,
}

impl DocumentUploader {
    pub fn new(store: Arc<dyn KnowledgeStore>, embeddings: EmbeddingService, splitter: RecursiveTextSplitter) -> Self {
        Self {
            store,
            embeddings,
            splitter,
        }
    }

    /// 依副檔名抽取文字、切塊、嵌入後寫入知識庫
    pub async fn process_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        user_id: UserId,
    ) -> std::result::Result<UploadReport, UploadError> {
        let Some(kind) = DocumentKind::from_filename(filename) else {
            return Err(UploadError::Unsupported {
                extension: extract::file_extension(filename),
            });
        };

        let file_hash = md5_hex(&bytes);
        if self.store.document_exists(&file_hash).await? {
            tracing::info!("📄 Duplicate upload of {} ({})", filename, file_hash);
            return Err(UploadError::Duplicate);
        }

        let (text, empty_error) = match kind {
            DocumentKind::Pdf => (extract::extract_pdf_text(bytes).await, UploadError::EmptyPdf),
            DocumentKind::PlainText => (extract::decode_text(&bytes), UploadError::EmptyText),
            DocumentKind::Docx => (extract::extract_docx_text(&bytes), UploadError::EmptyDocx),
        };

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Err(empty_error);
        }

        self.store_text(&text, filename, &file_hash, user_id).await
    }

    async fn store_text(
        &self,
        text: &str,
        filename: &str,
        file_hash: &str,
        user_id: UserId,
    ) -> std::result::Result<UploadReport, UploadError> {
        let chunks = self.splitter.split_text(text);
        if chunks.is_empty() {
            return Err(UploadError::NoChunks);
        }

        let document_id = self.store.add_document(filename, file_hash, user_id).await?;
        let total_chunks = chunks.len();
        let mut stored = 0usize;
        let mut failed = 0usize;

        for (index, content) in chunks.into_iter().enumerate() {
            let Some(embedding) = self.embeddings.create_embedding(&content).await else {
                tracing::warn!("⚠️ Skipping chunk {} of {}: embedding failed", index, filename);
                failed += 1;
                continue;
            };

            let chunk = NewChunk {
                document_id,
                chunk_index: index as i32,
                content,
                embedding,
                metadata: json!({
                    "filename": filename,
                    "chunk_index": index,
                    "total_chunks": total_chunks,
                    "uploaded_by": user_id,
                }),
            };
            self.store.add_chunk(&chunk).await?;
            stored += 1;
        }

        self.store.set_chunk_count(document_id, stored as i32).await?;

        if failed > 0 {
            tracing::warn!("⚠️ {}: {} of {} chunks skipped", filename, failed, total_chunks);
        }
        tracing::info!("✅ Document {} processed: {} chunks", filename, stored);

        Ok(UploadReport {
            document_id,
            filename: filename.to_string(),
            chunks_created: stored,
            total_text_length: text.chars().count(),
        })
    }

    /// 讀取失敗時記錄並回傳空清單
    pub async fn documents(&self) -> Vec<KnowledgeDocument> {
        match self.store.documents().await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("❌ Failed to list documents: {}", e);
                Vec::new()
            }
        }
    }

    /// 片段由資料庫 cascade 一併刪除
    pub async fn delete_document(&self, document_id: i32) -> bool {
        match self.store.delete_document(document_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!("❌ Failed to delete document {}: {}", document_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::tests::{build_docx, docx_body};
    use crate::domain::model::{ChunkMatch, KnowledgeStats, UsageRecord};
    use crate::domain::ports::Embedder;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryKnowledge {
        documents: Mutex<HashMap<i32, (String, String, i32)>>,
        chunks: Mutex<Vec<NewChunk>>,
    }

    #[async_trait]
    impl KnowledgeStore for MemoryKnowledge {
        async fn document_exists(&self, file_hash: &str) -> Result<bool> {
            Ok(self.documents.lock().await.values().any(|(_, hash, _)| hash == file_hash))
        }
        async fn add_document(&self, filename: &str, file_hash: &str, _uploaded_by: UserId) -> Result<i32> {
            let mut docs = self.documents.lock().await;
            let id = docs.len() as i32 + 1;
            docs.insert(id, (filename.to_string(), file_hash.to_string(), 0));
            Ok(id)
        }
        async fn add_chunk(&self, chunk: &NewChunk) -> Result<()> {
            self.chunks.lock().await.push(chunk.clone());
            Ok(())
        }
        async fn set_chunk_count(&self, document_id: i32, total_chunks: i32) -> Result<()> {
            if let Some(doc) = self.documents.lock().await.get_mut(&document_id) {
                doc.2 = total_chunks;
            }
            Ok(())
        }
        async fn search_chunks(&self, _embedding: &[f32], _limit: i64) -> Result<Vec<ChunkMatch>> {
            Ok(Vec::new())
        }
        async fn log_usage(&self, _usage: &UsageRecord) -> Result<()> {
            Ok(())
        }
        async fn stats(&self) -> Result<KnowledgeStats> {
            Ok(KnowledgeStats::default())
        }
        async fn documents(&self) -> Result<Vec<KnowledgeDocument>> {
            Err(BotError::processing("listing unavailable"))
        }
        async fn delete_document(&self, document_id: i32) -> Result<bool> {
            Ok(self.documents.lock().await.remove(&document_id).is_some())
        }
        async fn close(&self) {}
    }

    /// 第 `fail_on` 次呼叫失敗
    struct FlakyEmbedder {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, _input: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(call) == self.fail_on {
                return Err(BotError::processing("rate limited"));
            }
            Ok(vec![0.25; 3])
        }
    }

    fn uploader(store: Arc<MemoryKnowledge>, fail_on: Option<usize>, chunk_size: usize) -> DocumentUploader {
        let embedder = FlakyEmbedder {
            calls: AtomicUsize::new(0),
            fail_on,
        };
        DocumentUploader::new(
            store,
            EmbeddingService::new(Arc::new(embedder)),
            RecursiveTextSplitter::new(chunk_size, 0),
        )
    }

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn test_text_upload_stores_chunks_with_metadata() {
        let store = Arc::new(MemoryKnowledge::default());
        let uploader = uploader(store.clone(), None, 30);

        let text = "Substation layout.\n\nBreaker ratings table.";
        let report = uploader
            .process_file(text.as_bytes().to_vec(), "notes.md", 11)
            .await
            .unwrap();

        assert_eq!(report.document_id, 1);
        assert_eq!(report.chunks_created, 2);
        assert_eq!(report.total_text_length, text.chars().count());

        let chunks = store.chunks.lock().await;
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].content, "Breaker ratings table.");
        assert_eq!(
            chunks[1].metadata,
            json!({"filename": "notes.md", "chunk_index": 1, "total_chunks": 2, "uploaded_by": 11})
        );
        assert_eq!(store.documents.lock().await[&1].2, 2);
    }

    #[tokio::test]
    async fn test_failed_embeddings_are_skipped() {
        let store = Arc::new(MemoryKnowledge::default());
        let uploader = uploader(store.clone(), Some(0), 30);

        let report = uploader
            .process_file(b"Substation layout.\n\nBreaker ratings table.".to_vec(), "notes.txt", 11)
            .await
            .unwrap();

        assert_eq!(report.chunks_created, 1);
        assert_eq!(store.chunks.lock().await[0].chunk_index, 1);
        assert_eq!(store.documents.lock().await[&1].2, 1);
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_rejected() {
        let store = Arc::new(MemoryKnowledge::default());
        let uploader = uploader(store, None, 1000);
        let bytes = b"Voltage regulation guide".to_vec();

        uploader.process_file(bytes.clone(), "a.txt", 1).await.unwrap();
        let err = uploader.process_file(bytes, "b.txt", 1).await.unwrap_err();
        assert!(matches!(err, UploadError::Duplicate));
        assert_eq!(err.to_string(), "Этот документ уже загружен");
    }

    #[tokio::test]
    async fn test_rejections() {
        let store = Arc::new(MemoryKnowledge::default());
        let uploader = uploader(store, None, 1000);

        let err = uploader.process_file(b"x".to_vec(), "photo.PNG", 1).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Неподдерживаемый формат файла: .png. Используйте PDF, TXT, MD или DOCX."
        );

        let err = uploader.process_file(b"  short  ".to_vec(), "tiny.txt", 1).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyText));

        let err = uploader.process_file(b"broken".to_vec(), "broken.docx", 1).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyDocx));
    }

    #[tokio::test]
    async fn test_docx_upload() {
        let store = Arc::new(MemoryKnowledge::default());
        let uploader = uploader(store.clone(), None, 1000);
        let docx = build_docx(&docx_body(
            "<w:p><w:r><w:t>Grounding of transformer neutrals</w:t></w:r></w:p>",
        ));

        let report = uploader.process_file(docx, "grounding.docx", 3).await.unwrap();
        assert_eq!(report.chunks_created, 1);
        assert_eq!(store.chunks.lock().await[0].content, "Grounding of transformer neutrals");
    }

    #[tokio::test]
    async fn test_listing_failure_yields_empty_list() {
        let uploader = uploader(Arc::new(MemoryKnowledge::default()), None, 1000);
        assert!(uploader.documents().await.is_empty());
        assert!(!uploader.delete_document(99).await);
    }
}
