use crate::domain::model::{ChatMessage, CompletionParams, UserId};
use crate::domain::ports::ChatModel;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 送給模型的歷史訊息上限（三組問答）
pub const MAX_HISTORY_MESSAGES: usize = 6;

pub const TIMEOUT_REPLY: &str =
    "⏳ Sorry, the response is taking longer than expected. Please try again later or use the menu buttons.";
pub const UNAVAILABLE_REPLY: &str =
    "The AI assistant is currently unavailable. Please use the menu buttons or try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Plain,
    Rag,
}

/// 讀取系統提示檔；讀不到時記錄錯誤並回傳空字串
pub fn load_prompt<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("❌ Failed to read system prompt {}: {}", path.display(), e);
            String::new()
        }
    }
}

pub struct AiAssistant {
    model: Arc<dyn ChatModel>,
    params: CompletionParams,
    timeout: Duration,
    system_prompt: String,
    rag_system_prompt: String,
}

impl AiAssistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        params: CompletionParams,
        timeout: Duration,
        system_prompt: String,
        rag_system_prompt: String,
    ) -> Self {
        tracing::info!("🤖 AI assistant initialized with model: {}", model.model());
        Self {
            model,
            params,
            timeout,
            system_prompt,
            rag_system_prompt,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// 系統提示（非空時）+ 最後六則歷史 + 本次訊息
    pub fn build_messages(&self, message: &str, history: &[ChatMessage], mode: PromptMode) -> Vec<ChatMessage> {
        let system_prompt = match mode {
            PromptMode::Plain => &self.system_prompt,
            PromptMode::Rag => &self.rag_system_prompt,
        };

        let mut messages = Vec::with_capacity(MAX_HISTORY_MESSAGES + 2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt.as_str()));
        }
        let skip = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        messages.extend(history[skip..].iter().cloned());
        messages.push(ChatMessage::user(message));
        messages
    }

    /// 永遠回傳可以直接送給使用者的文字；逾時與錯誤改用固定回覆
    pub async fn get_response(
        &self,
        message: &str,
        user_id: UserId,
        history: &[ChatMessage],
        mode: PromptMode,
    ) -> String {
        let messages = self.build_messages(message, history, mode);
        tracing::debug!("Sending {} messages to {} for user {}", messages.len(), self.model.model(), user_id);

        match tokio::time::timeout(self.timeout, self.model.complete(&messages, self.params)).await {
            Ok(Ok(completion)) => {
                match completion.total_tokens {
                    Some(tokens) => tracing::info!("✅ AI response generated for user {}, tokens: {}", user_id, tokens),
                    None => tracing::info!("✅ AI response generated for user {}", user_id),
                }
                clean_completion(&completion.content)
            }
            Ok(Err(e)) => {
                tracing::error!("❌ AI request failed for user {}: {}", user_id, e);
                UNAVAILABLE_REPLY.to_string()
            }
            Err(_) => {
                tracing::warn!("⏳ AI request timed out for user {} after {:?}", user_id, self.timeout);
                TIMEOUT_REPLY.to_string()
            }
        }
    }
}

fn clean_completion(content: &str) -> String {
    content.trim().replace("```", "").trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::{Completion, Role};
    use crate::utils::error::{BotError, Result};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// 記錄收到的訊息並回傳固定內容
    pub(crate) struct ScriptedModel {
        pub reply: Result<String>,
        pub delay: Option<Duration>,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model(&self) -> &str {
            "test-model"
        }

        async fn complete(&self, messages: &[ChatMessage], _params: CompletionParams) -> Result<Completion> {
            self.seen.lock().await.push(messages.to_vec());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(content) => Ok(Completion {
                    content: content.clone(),
                    total_tokens: Some(42),
                }),
                Err(_) => Err(BotError::OpenAiError {
                    status: 503,
                    message: "overloaded".to_string(),
                }),
            }
        }
    }

    pub(crate) fn assistant_with(model: Arc<ScriptedModel>) -> AiAssistant {
        AiAssistant::new(
            model,
            CompletionParams {
                max_tokens: 500,
                temperature: 0.7,
            },
            Duration::from_secs(15),
            "plain prompt".to_string(),
            "rag prompt".to_string(),
        )
    }

    #[test]
    fn test_history_is_capped_and_prompt_selected() {
        let assistant = assistant_with(Arc::new(ScriptedModel::replying("ok")));
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{}", i))
                } else {
                    ChatMessage::assistant(format!("a{}", i))
                }
            })
            .collect();

        let messages = assistant.build_messages("now", &history, PromptMode::Rag);
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0], ChatMessage::system("rag prompt"));
        assert_eq!(messages[1].content, "q2");
        assert_eq!(messages.last().unwrap(), &ChatMessage::user("now"));
    }

    #[test]
    fn test_empty_prompt_sends_no_system_message() {
        let mut assistant = assistant_with(Arc::new(ScriptedModel::replying("ok")));
        assistant.system_prompt.clear();
        let messages = assistant.build_messages("hello", &[], PromptMode::Plain);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn test_missing_prompt_file_is_empty() {
        assert_eq!(load_prompt("/nonexistent/prompt.txt"), "");
    }

    #[tokio::test]
    async fn test_response_is_cleaned() {
        let model = Arc::new(ScriptedModel::replying("  ```\nTransformer losses\n```  "));
        let assistant = assistant_with(model.clone());

        let reply = assistant.get_response("q", 7, &[], PromptMode::Plain).await;
        assert_eq!(reply, "Transformer losses");
        assert_eq!(model.seen.lock().await[0][0], ChatMessage::system("plain prompt"));
    }

    #[tokio::test]
    async fn test_failure_yields_unavailable_text() {
        let model = Arc::new(ScriptedModel {
            reply: Err(BotError::processing("x")),
            delay: None,
            seen: Mutex::new(Vec::new()),
        });
        let reply = assistant_with(model).get_response("q", 7, &[], PromptMode::Plain).await;
        assert_eq!(reply, UNAVAILABLE_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_timeout_text() {
        let model = Arc::new(ScriptedModel {
            reply: Ok("late".to_string()),
            delay: Some(Duration::from_secs(60)),
            seen: Mutex::new(Vec::new()),
        });
        let reply = assistant_with(model).get_response("q", 7, &[], PromptMode::Plain).await;
        assert_eq!(reply, TIMEOUT_REPLY);
    }
}
