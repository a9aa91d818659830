use crate::adapters::openai::OpenAiClient;
use crate::adapters::postgres::PgUserStore;
use crate::adapters::telegram::{LongPoller, TelegramClient};
use crate::config::{BotConfig, DEFAULT_EMBEDDING_MODEL};
use crate::core::assistant::{load_prompt, AiAssistant};
use crate::core::dispatcher::Dispatcher;
use crate::core::handlers::BotContext;
use crate::core::rag_system::{init_rag_system, RagComponents};
use crate::core::session::SessionStore;
use crate::domain::model::CompletionParams;
use crate::domain::ports::UpdateSource;
use crate::utils::error::{ErrorSeverity, Result};
use crate::utils::retry::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// long polling 主迴圈：每個事件各自一個 task，收到關閉訊號後等待進行中的 task
pub struct BotEngine<S: UpdateSource> {
    source: S,
    dispatcher: Arc<Dispatcher>,
    backoff: RetryPolicy,
}

impl<S: UpdateSource> BotEngine<S> {
    pub fn new(source: S, dispatcher: Dispatcher) -> Self {
        Self {
            source,
            dispatcher: Arc::new(dispatcher),
            backoff: RetryPolicy::new(u32::MAX, Duration::from_secs(1)).with_max_delay(Duration::from_secs(60)),
        }
    }

    /// 執行到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// 執行到 `shutdown` 完成；Critical 等級的輪詢錯誤會中止迴圈
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut failures: u32 = 0;
        let mut outcome = Ok(());

        tracing::info!("✅ Bot started, polling for updates");

        loop {
            let batch = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("🛑 Shutdown requested, stopping polling");
                    break;
                }
                batch = self.source.next_batch() => batch,
            };

            match batch {
                Ok(events) => {
                    failures = 0;
                    for event in events {
                        let dispatcher = Arc::clone(&self.dispatcher);
                        tasks.spawn(async move { dispatcher.dispatch(event).await });
                    }
                }
                Err(e) if e.severity() == ErrorSeverity::Critical => {
                    tracing::error!("❌ Polling stopped: {}", e);
                    outcome = Err(e);
                    break;
                }
                Err(e) => {
                    let wait = self.backoff.delay_for(failures);
                    failures = failures.saturating_add(1);
                    tracing::warn!("⚠️ Polling failed ({}), retrying in {:?}", e, wait);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            tracing::info!("🛑 Shutdown requested, stopping polling");
                            break;
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("❌ Update handler panicked: {}", e);
                }
            }
        }

        if !tasks.is_empty() {
            tracing::info!("⏳ Waiting for {} in-flight updates", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("❌ Update handler panicked: {}", e);
            }
        }

        self.close().await;
        outcome
    }

    async fn close(&self) {
        let ctx = self.dispatcher.context();
        if let Some(rag) = &ctx.rag {
            rag.close().await;
        }
        ctx.users.close().await;
        tracing::info!("✅ Bot stopped successfully");
    }
}

/// 建立所有外部連線並執行 bot，直到 Ctrl-C
pub async fn run_bot(config: BotConfig) -> Result<()> {
    let (min, max) = config.db_pool_size();
    let users = Arc::new(PgUserStore::connect(&config.database.url, min, max).await?);

    let (assistant, openai) = if config.ai.enabled {
        let embedding_model = config
            .rag
            .as_ref()
            .map(|rag| rag.embedding_model())
            .unwrap_or(DEFAULT_EMBEDDING_MODEL);
        // HTTP 逾時比對話逾時多 5 秒
        let openai = Arc::new(OpenAiClient::new(
            config.openai_base(),
            &config.ai.api_key,
            &config.ai.model,
            embedding_model,
            config.ai_timeout() + Duration::from_secs(5),
        )?);
        let assistant = AiAssistant::new(
            openai.clone(),
            CompletionParams {
                max_tokens: config.ai.max_tokens,
                temperature: config.ai.temperature,
            },
            config.ai_timeout(),
            load_prompt(config.system_prompt_path()),
            load_prompt(config.rag_system_prompt_path()),
        );
        (Some(Arc::new(assistant)), Some(openai))
    } else {
        (None, None)
    };

    let rag: Option<RagComponents> = match (&config.rag, &assistant, &openai) {
        (Some(rag_config), Some(assistant), Some(openai)) if config.rag_enabled() => {
            let components = init_rag_system(rag_config, openai.clone(), assistant.clone()).await;
            match &components {
                Some(_) => tracing::info!("✅ RAG system initialized"),
                None => tracing::warn!("⚠️ RAG system not initialized"),
            }
            components
        }
        _ => {
            tracing::info!("ℹ️ RAG disabled in settings");
            None
        }
    };

    let telegram = TelegramClient::new(config.telegram_api_base(), &config.telegram.token, config.poll_timeout())?;

    match &assistant {
        Some(assistant) => {
            tracing::info!("✅ AI enabled (model: {})", assistant.model_name());
            if config.collect_training_data() {
                tracing::info!("✅ Training data collection enabled");
            }
        }
        None => tracing::info!("❌ AI assistant disabled in settings"),
    }

    let ctx = BotContext {
        messenger: Arc::new(telegram.clone()),
        users,
        sessions: SessionStore::new(),
        assistant,
        rag,
        admin_ids: config.telegram.admin_ids.clone(),
        welcome_photo_id: config.telegram.welcome_photo_id.clone(),
    };

    let me = telegram.get_me().await?;
    let bot_username = me.username.unwrap_or_default();
    tracing::info!("🤖 Authorized as @{}", bot_username);

    telegram.drop_pending_updates().await?;
    let mut poller = LongPoller::new(telegram, config.poll_timeout());
    if !bot_username.is_empty() {
        poller = poller.with_bot_username(bot_username);
    }

    BotEngine::new(poller, Dispatcher::new(ctx)).run().await
}
