use crate::core::assistant::MAX_HISTORY_MESSAGES;
use crate::domain::model::{ChatMessage, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 每位使用者的對話狀態，只存在記憶體中
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub ai_history: Vec<ChatMessage>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<UserId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn history(&self, user_id: UserId) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .await
            .get(&user_id)
            .map(|s| s.ai_history.clone())
            .unwrap_or_default()
    }

    /// 追加一組問答，只保留最後六則
    pub async fn record_exchange(&self, user_id: UserId, question: &str, answer: &str) {
        let mut sessions = self.sessions.lock().await;
        let history = &mut sessions.entry(user_id).or_default().ai_history;
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));
        if history.len() > MAX_HISTORY_MESSAGES {
            let excess = history.len() - MAX_HISTORY_MESSAGES;
            history.drain(..excess);
        }
    }

    pub async fn clear_history(&self, user_id: UserId) {
        if let Some(session) = self.sessions.lock().await.get_mut(&user_id) {
            session.ai_history.clear();
        }
    }

    pub async fn clear(&self, user_id: UserId) {
        self.sessions.lock().await.remove(&user_id);
    }
}
