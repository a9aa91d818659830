//! 冪等的建表語句，啟動時依序執行。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableName {
    UserRegistration,
    UserWhiteList,
    RagDocuments,
    RagChunks,
    RagUsageStats,
}

impl TableName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::UserRegistration => "user_registration",
            TableName::UserWhiteList => "user_white_list",
            TableName::RagDocuments => "rag_documents",
            TableName::RagChunks => "rag_chunks",
            TableName::RagUsageStats => "rag_usage_stats",
        }
    }
}

pub struct TableSchema {
    pub table: TableName,
    pub create: &'static str,
    pub indexes: &'static [&'static str],
}

pub const USER_TABLES: &[TableSchema] = &[
    TableSchema {
        table: TableName::UserRegistration,
        create: r#"
            CREATE TABLE IF NOT EXISTS user_registration (
                telegram_id BIGINT PRIMARY KEY,
                registered_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                user_name VARCHAR(25) NOT NULL UNIQUE
            )
        "#,
        indexes: &[
            "CREATE INDEX IF NOT EXISTS idx_user_registered_at ON user_registration(registered_at)",
            "CREATE INDEX IF NOT EXISTS idx_user_registration_user_name ON user_registration(user_name)",
        ],
    },
    TableSchema {
        table: TableName::UserWhiteList,
        create: r#"
            CREATE TABLE IF NOT EXISTS user_white_list (
                id SERIAL PRIMARY KEY,
                user_name VARCHAR(25) NOT NULL UNIQUE,
                added_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        indexes: &[
            // 舊版資料表沒有 added_at
            "ALTER TABLE user_white_list ADD COLUMN IF NOT EXISTS added_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP",
            "CREATE INDEX IF NOT EXISTS idx_user_white_list_user_name ON user_white_list(user_name)",
        ],
    },
];

pub const VECTOR_EXTENSION: &str = "CREATE EXTENSION IF NOT EXISTS vector";

pub const KNOWLEDGE_TABLES: &[TableSchema] = &[
    TableSchema {
        table: TableName::RagDocuments,
        create: r#"
            CREATE TABLE IF NOT EXISTS rag_documents (
                id SERIAL PRIMARY KEY,
                filename VARCHAR(255) NOT NULL,
                file_hash VARCHAR(64) UNIQUE NOT NULL,
                uploaded_by BIGINT NOT NULL,
                total_chunks INTEGER DEFAULT 0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        indexes: &[],
    },
    TableSchema {
        table: TableName::RagChunks,
        create: r#"
            CREATE TABLE IF NOT EXISTS rag_chunks (
                id SERIAL PRIMARY KEY,
                document_id INTEGER REFERENCES rag_documents(id) ON DELETE CASCADE,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding vector(1536),
                metadata JSONB DEFAULT '{}',
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        indexes: &["CREATE INDEX IF NOT EXISTS idx_rag_chunks_document_id ON rag_chunks(document_id)"],
    },
    TableSchema {
        table: TableName::RagUsageStats,
        create: r#"
            CREATE TABLE IF NOT EXISTS rag_usage_stats (
                id SERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                query TEXT,
                chunks_used INTEGER DEFAULT 0,
                response_time_ms INTEGER DEFAULT 0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        indexes: &["CREATE INDEX IF NOT EXISTS idx_rag_usage_created_at ON rag_usage_stats(created_at)"],
    },
];
