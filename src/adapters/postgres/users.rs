use super::{connect_pool, create_tables, schema::USER_TABLES};
use crate::domain::model::{RegisteredUser, RegistrationOutcome, UserId};
use crate::domain::ports::UserStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(url: &str, min_connections: u32, max_connections: u32) -> Result<Self> {
        let pool = connect_pool(url, min_connections, max_connections).await?;
        tracing::info!("✅ PostgreSQL connection pool initialized");

        create_tables(&pool, USER_TABLES).await?;
        tracing::info!("✅ Database initialization completed successfully");
        Ok(Self { pool })
    }

    async fn try_register(&self, telegram_id: UserId, username: &str) -> Result<RegistrationOutcome> {
        // 交易在 drop 時自動 rollback
        let mut tx = self.pool.begin().await?;

        let in_white_list: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM user_white_list WHERE user_name = $1")
                .bind(username)
                .fetch_one(&mut *tx)
                .await?;

        if !in_white_list {
            return Ok(RegistrationOutcome::NotWhiteListed);
        }

        let inserted = sqlx::query("INSERT INTO user_registration (telegram_id, user_name) VALUES ($1, $2)")
            .bind(telegram_id)
            .bind(username)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                tracing::info!("✅ User {} registered as @{}", telegram_id, username);
                Ok(RegistrationOutcome::Registered)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(RegistrationOutcome::AlreadyRegistered)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user(&self, telegram_id: UserId) -> Result<Option<RegisteredUser>> {
        let row = sqlx::query_as::<_, (i64, String, Option<NaiveDateTime>)>(
            "SELECT telegram_id, user_name, registered_at FROM user_registration WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(telegram_id, user_name, registered_at)| RegisteredUser {
            telegram_id,
            user_name,
            registered_at,
        }))
    }

    async fn register_user(&self, telegram_id: UserId, username: &str) -> Result<RegistrationOutcome> {
        if username.is_empty() {
            return Ok(RegistrationOutcome::MissingUsername);
        }

        match self.try_register(telegram_id, username).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("❌ Database error while registering user {}: {}", telegram_id, e);
                Ok(RegistrationOutcome::InternalError)
            }
        }
    }

    async fn delete_user(&self, telegram_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_registration WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("🗑️ User {} successfully deleted", telegram_id);
        } else {
            tracing::warn!("⚠️ User {} not found for deletion", telegram_id);
        }
        Ok(deleted)
    }

    async fn is_white_listed(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_white_list WHERE user_name = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn white_list(&self) -> Result<Vec<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT user_name FROM user_white_list ORDER BY added_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|name| format!("@{}", name)).collect())
    }

    async fn add_to_white_list(&self, username: &str) -> Result<()> {
        sqlx::query("INSERT INTO user_white_list (user_name) VALUES ($1) ON CONFLICT (user_name) DO NOTHING")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_from_white_list(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_white_list WHERE user_name = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("✅ PostgreSQL connection pool closed");
    }
}
