//! PostgreSQL 儲存層：使用者 / white list 與 pgvector 知識庫。

pub mod knowledge;
pub mod schema;
pub mod users;

use crate::utils::error::Result;
use schema::TableSchema;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub use knowledge::PgKnowledgeStore;
pub use users::PgUserStore;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn connect_pool(url: &str, min_connections: u32, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .connect(url)
        .await?;

    let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    Ok(pool)
}

pub async fn create_tables(pool: &PgPool, tables: &[TableSchema]) -> Result<()> {
    for schema in tables {
        sqlx::query(schema.create).execute(pool).await?;
        for index_sql in schema.indexes {
            sqlx::query(index_sql).execute(pool).await?;
        }
        tracing::info!("✅ Table '{}' created/verified", schema.table.as_str());
    }
    Ok(())
}
