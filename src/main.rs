use clap::Parser;
use voltic_bot::core::bot::run_bot;
use voltic_bot::utils::error::BotError;
use voltic_bot::utils::{logger, validation::Validate};
use voltic_bot::{BotConfig, CliArgs};

fn fail(e: &BotError) -> ! {
    tracing::error!(
        "❌ voltic-bot failed: {} (Severity: {:?})",
        e,
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_path = args.config_path();

    // 日誌設定來自設定檔，載入失敗時只能直接輸出到 stderr
    let config = match BotConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", config_path, e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    if args.json_logs || config.json_logs() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("Starting voltic-bot with {}", config_path);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    if args.check {
        println!("✅ Configuration is valid: {}", config_path);
        println!("   AI: {}", if config.ai.enabled { config.ai.model.as_str() } else { "disabled" });
        println!("   RAG: {}", if config.rag_enabled() { "enabled" } else { "disabled" });
        println!("   Admins: {}", config.telegram.admin_ids.len());
        return;
    }

    match run_bot(config).await {
        Ok(()) => tracing::info!("👋 voltic-bot exited cleanly"),
        Err(e) => fail(&e),
    }
}
