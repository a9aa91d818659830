use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Telegram API error: {description}")]
    TelegramError {
        code: Option<i64>,
        description: String,
    },

    #[error("OpenAI API error ({status}): {message}")]
    OpenAiError { status: u16, message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn processing(message: impl Into<String>) -> Self {
        BotError::ProcessingError {
            message: message.into(),
        }
    }

    /// 嚴重程度，CLI 依此決定退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::ApiError(_) | BotError::Timeout { .. } | BotError::OpenAiError { .. } => {
                ErrorSeverity::Medium
            }
            BotError::TelegramError { code, .. } => match code {
                Some(401) | Some(404) => ErrorSeverity::Critical,
                _ => ErrorSeverity::Medium,
            },
            BotError::DatabaseError(_) | BotError::IoError(_) => ErrorSeverity::Critical,
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. } => ErrorSeverity::High,
            BotError::SerializationError(_)
            | BotError::ZipError(_)
            | BotError::XmlError(_)
            | BotError::ProcessingError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BotError::ApiError(_) | BotError::Timeout { .. } => {
                "Check network connectivity and retry"
            }
            BotError::TelegramError { code: Some(401), .. } => {
                "The bot token was rejected, check telegram.token"
            }
            BotError::TelegramError { .. } => "Check the Telegram Bot API status and retry",
            BotError::OpenAiError { .. } => "Check ai.api_key, ai.model and the account quota",
            BotError::DatabaseError(_) => {
                "Make sure PostgreSQL is reachable and database.url / rag.database_url are correct"
            }
            BotError::IoError(_) => "Check file paths and permissions",
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. } => {
                "Fix the configuration file (see bot.example.toml)"
            }
            BotError::SerializationError(_) | BotError::ZipError(_) | BotError::XmlError(_) => {
                "The payload could not be decoded, check the input data"
            }
            BotError::ProcessingError { .. } => "Inspect the logs for the failing step",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for '{}': {}", field, reason)
            }
            BotError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            BotError::DatabaseError(e) => format!("Database is unavailable: {}", e),
            other => other.to_string(),
        }
    }

    /// 退出碼：Low 0、High 1、Medium 2、Critical 3
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_maps_to_exit_code() {
        let err = BotError::MissingConfigError {
            field: "telegram.token".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);

        let err = BotError::TelegramError {
            code: Some(401),
            description: "Unauthorized".to_string(),
        };
        assert_eq!(err.exit_code(), 3);

        let err = BotError::Timeout { seconds: 15 };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = BotError::InvalidConfigValueError {
            field: "ai.temperature".to_string(),
            value: "3".to_string(),
            reason: "Value must be between 0 and 2".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Invalid configuration for 'ai.temperature': Value must be between 0 and 2"
        );
    }
}
