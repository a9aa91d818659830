use super::{connect_pool, create_tables, schema::KNOWLEDGE_TABLES, schema::VECTOR_EXTENSION};
use crate::domain::model::{ChunkMatch, KnowledgeDocument, KnowledgeStats, NewChunk, UsageRecord, UserId};
use crate::domain::ports::KnowledgeStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;

/// pgvector 接受 `[1,2,3]` 形式的文字輸入
pub fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[derive(Clone)]
pub struct PgKnowledgeStore {
    pool: PgPool,
}

impl PgKnowledgeStore {
    pub async fn connect(url: &str, min_connections: u32, max_connections: u32) -> Result<Self> {
        let pool = connect_pool(url, min_connections, max_connections).await?;
        sqlx::query(VECTOR_EXTENSION).execute(&pool).await?;
        create_tables(&pool, KNOWLEDGE_TABLES).await?;
        tracing::info!("✅ Knowledge database connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl KnowledgeStore for PgKnowledgeStore {
    async fn document_exists(&self, file_hash: &str) -> Result<bool> {
        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM rag_documents WHERE file_hash = $1")
            .bind(file_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(existing.is_some())
    }

    async fn add_document(&self, filename: &str, file_hash: &str, uploaded_by: UserId) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO rag_documents (filename, file_hash, uploaded_by) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(filename)
        .bind(file_hash)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn add_chunk(&self, chunk: &NewChunk) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rag_chunks (document_id, chunk_index, content, embedding, metadata)
            VALUES ($1, $2, $3, $4::text::vector, $5)
            "#,
        )
        .bind(chunk.document_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.content)
        .bind(vector_literal(&chunk.embedding))
        .bind(&chunk.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_chunk_count(&self, document_id: i32, total_chunks: i32) -> Result<()> {
        sqlx::query("UPDATE rag_documents SET total_chunks = $1 WHERE id = $2")
            .bind(total_chunks)
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn search_chunks(&self, embedding: &[f32], limit: i64) -> Result<Vec<ChunkMatch>> {
        let rows = sqlx::query_as::<_, (i32, String, Option<serde_json::Value>, String, f64)>(
            r#"
            SELECT
                c.id,
                c.content,
                c.metadata,
                d.filename,
                1 - (c.embedding <=> $1::text::vector) AS similarity
            FROM rag_chunks c
            JOIN rag_documents d ON c.document_id = d.id
            WHERE c.embedding IS NOT NULL
            ORDER BY c.embedding <=> $1::text::vector
            LIMIT $2
            "#,
        )
        .bind(vector_literal(embedding))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, content, metadata, filename, similarity)| ChunkMatch {
                id,
                content,
                metadata: metadata.unwrap_or_else(|| serde_json::json!({})),
                filename,
                similarity,
            })
            .collect())
    }

    async fn log_usage(&self, usage: &UsageRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO rag_usage_stats (user_id, query, chunks_used, response_time_ms) VALUES ($1, $2, $3, $4)",
        )
        .bind(usage.user_id)
        .bind(&usage.query)
        .bind(usage.chunks_used)
        .bind(usage.response_time_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<KnowledgeStats> {
        let documents_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_documents")
            .fetch_one(&self.pool)
            .await?;
        let chunks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_chunks")
            .fetch_one(&self.pool)
            .await?;
        let queries_today: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rag_usage_stats WHERE created_at::date = CURRENT_DATE")
                .fetch_one(&self.pool)
                .await?;
        let total_queries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_usage_stats")
            .fetch_one(&self.pool)
            .await?;

        Ok(KnowledgeStats {
            documents_count,
            chunks_count,
            queries_today,
            total_queries,
        })
    }

    async fn documents(&self) -> Result<Vec<KnowledgeDocument>> {
        let rows = sqlx::query_as::<_, (i32, String, Option<i32>, i64, Option<NaiveDateTime>)>(
            r#"
            SELECT id, filename, total_chunks, uploaded_by, created_at
            FROM rag_documents
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, filename, total_chunks, uploaded_by, created_at)| KnowledgeDocument {
                id,
                filename,
                total_chunks: total_chunks.unwrap_or(0),
                uploaded_by,
                created_at: created_at.unwrap_or_default(),
            })
            .collect())
    }

    async fn delete_document(&self, document_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rag_documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("✅ Knowledge database connections closed");
    }
}
