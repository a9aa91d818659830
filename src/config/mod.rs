#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{BotError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_OPENAI_API: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_PROMPT_PATH: &str = "docs/bot_instructions_non_RAG.txt";
pub const DEFAULT_RAG_PROMPT_PATH: &str = "docs/bot_instructions_for_rag.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub rag: Option<RagConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    #[serde(default, deserialize_with = "deserialize_admin_ids")]
    pub admin_ids: Vec<i64>,
    pub welcome_photo_id: String,
    pub api_base_url: Option<String>,
    pub poll_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
    pub system_prompt_path: Option<String>,
    pub rag_system_prompt_path: Option<String>,
    pub collect_training_data: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub enabled: bool,
    #[serde(default)]
    pub database_url: String,
    pub embedding_model: Option<String>,
    pub similarity_threshold: Option<f64>,
    pub search_limit: Option<i64>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
    pub connect_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AdminIds {
    List(Vec<i64>),
    Csv(String),
}

/// 接受整數陣列或以逗號分隔的字串（例如 `"${ADMIN_IDS}"` 取代後的值）
fn deserialize_admin_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match AdminIds::deserialize(deserializer)? {
        AdminIds::List(ids) => Ok(ids),
        AdminIds::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|e| serde::de::Error::custom(format!("invalid admin id '{}': {}", part, e)))
            })
            .collect(),
    }
}

impl BotConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BOT_TOKEN})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn telegram_api_base(&self) -> &str {
        self.telegram
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_TELEGRAM_API)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.poll_timeout_seconds.unwrap_or(30))
    }

    pub fn openai_base(&self) -> &str {
        self.ai.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_API)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_seconds.unwrap_or(15))
    }

    pub fn system_prompt_path(&self) -> &str {
        self.ai
            .system_prompt_path
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_PATH)
    }

    pub fn rag_system_prompt_path(&self) -> &str {
        self.ai
            .rag_system_prompt_path
            .as_deref()
            .unwrap_or(DEFAULT_RAG_PROMPT_PATH)
    }

    pub fn collect_training_data(&self) -> bool {
        self.ai.collect_training_data.unwrap_or(false)
    }

    /// RAG 只有在 AI 也啟用時才會初始化
    pub fn rag_enabled(&self) -> bool {
        self.ai.enabled && self.rag.as_ref().map(|r| r.enabled).unwrap_or(false)
    }

    pub fn db_pool_size(&self) -> (u32, u32) {
        (
            self.database.min_connections.unwrap_or(2),
            self.database.max_connections.unwrap_or(20),
        )
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("telegram.token", &self.telegram.token)?;
        validation::validate_resolved("telegram.token", &self.telegram.token)?;
        validation::validate_url("telegram.api_base_url", self.telegram_api_base())?;

        validation::validate_resolved("database.url", &self.database.url)?;
        validation::validate_postgres_url("database.url", &self.database.url)?;
        let (min, max) = self.db_pool_size();
        validation::validate_positive_number("database.max_connections", max as usize, min.max(1) as usize)?;

        if self.ai.enabled {
            validation::validate_non_empty_string("ai.api_key", &self.ai.api_key)?;
            validation::validate_resolved("ai.api_key", &self.ai.api_key)?;
            validation::validate_url("ai.base_url", self.openai_base())?;
            validation::validate_non_empty_string("ai.model", &self.ai.model)?;
            validation::validate_range("ai.temperature", self.ai.temperature, 0.0, 2.0)?;
            validation::validate_positive_number("ai.max_tokens", self.ai.max_tokens as usize, 1)?;
        }

        if let Some(rag) = self.rag.as_ref().filter(|r| r.enabled) {
            rag.validate()?;
        }

        Ok(())
    }
}

impl RagConfig {
    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or(DEFAULT_EMBEDDING_MODEL)
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold.unwrap_or(0.7)
    }

    pub fn search_limit(&self) -> i64 {
        self.search_limit.unwrap_or(4)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(1000)
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap.unwrap_or(200)
    }

    pub fn pool_size(&self) -> (u32, u32) {
        (self.min_connections.unwrap_or(2), self.max_connections.unwrap_or(10))
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.unwrap_or(5)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds.unwrap_or(2))
    }
}

impl Validate for RagConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_resolved("rag.database_url", &self.database_url)?;
        validation::validate_postgres_url("rag.database_url", &self.database_url)?;
        validation::validate_range("rag.similarity_threshold", self.similarity_threshold(), 0.0, 1.0)?;
        validation::validate_positive_number("rag.search_limit", self.search_limit().max(0) as usize, 1)?;
        validation::validate_positive_number("rag.chunk_size", self.chunk_size(), 1)?;
        if self.chunk_overlap() >= self.chunk_size() {
            return Err(BotError::InvalidConfigValueError {
                field: "rag.chunk_overlap".to_string(),
                value: self.chunk_overlap().to_string(),
                reason: format!("Must be smaller than rag.chunk_size ({})", self.chunk_size()),
            });
        }
        validation::validate_positive_number("rag.connect_attempts", self.connect_attempts() as usize, 1)?;
        Ok(())
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
