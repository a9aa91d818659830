use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "voltic-bot")]
#[command(about = "Telegram assistant bot with white-list access and a RAG knowledge base")]
pub struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    pub check: bool,
}

impl CliArgs {
    pub fn config_path(&self) -> String {
        self.config
            .clone()
            .unwrap_or_else(|| default_config_path(std::env::var("ENVIRONMENT").ok().as_deref()).to_string())
    }
}

/// `ENVIRONMENT=production` 時使用正式環境的設定檔
pub fn default_config_path(environment: Option<&str>) -> &'static str {
    match environment {
        Some("production") => "bot.production.toml",
        _ => "bot.toml",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(default_config_path(Some("production")), "bot.production.toml");
        assert_eq!(default_config_path(Some("staging")), "bot.toml");
        assert_eq!(default_config_path(None), "bot.toml");
    }

    #[test]
    fn test_explicit_config_wins() {
        let args = CliArgs::parse_from(["voltic-bot", "--config", "custom.toml", "--check"]);
        assert_eq!(args.config_path(), "custom.toml");
        assert!(args.check);
        assert!(!args.verbose);
    }
}
