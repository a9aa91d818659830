use super::BotContext;
use crate::core::assistant::{AiAssistant, PromptMode};
use crate::domain::model::{ChatId, Reply, Sender};
use crate::utils::error::Result;

pub const WELCOME_CAPTION: &str =
    "👋 Добро пожаловать, я твой помощник в мире энергетики, задавай мне вопросы и я обязательно помогу тебе!";
pub const WELCOME_BACK: &str = "С возвращением!";
pub const NOT_LOGGED_IN: &str = "❌ You are not logged in.";
pub const LOGGED_OUT: &str =
    "✅ Ваши данные успешно удалены из системы.\n\n🔁 Для повторной регистрации, обратитесь к администратору.\n\n";
pub const LOGOUT_FAILED: &str = "❌ Error during logout. Please try again later.";
pub const NOT_REGISTERED: &str = "❌ Вы не зарегистрированы в системе";
pub const USE_BUTTONS: &str = "🤔 Use the buttons below to interact with the bot.";
pub const TECHNICAL_ERROR: &str =
    "🤖 Sorry, there was a technical error. Please use the menu buttons or try again later.";

/// /start
pub async fn start(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    tracing::info!("👋 User {} sent /start", sender.id);

    if ctx.is_registered(sender.id).await? {
        ctx.reply_text(chat_id, WELCOME_BACK).await?;
        return Ok(());
    }

    tracing::info!("User {} is not registered", sender.id);
    ctx.sessions.clear(sender.id).await;
    let caption = Reply::text(WELCOME_CAPTION).keyboard(crate::core::keyboard::auth_keyboard());
    ctx.messenger
        .send_photo(chat_id, &ctx.welcome_photo_id, &caption)
        .await?;
    Ok(())
}

/// /exit：刪除註冊資料並清掉對話歷史
pub async fn logout(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    if !ctx.is_registered(sender.id).await? {
        ctx.reply_with_auth(chat_id, NOT_LOGGED_IN).await?;
        return Ok(());
    }

    match ctx.users.delete_user(sender.id).await {
        Ok(true) => {
            ctx.sessions.clear_history(sender.id).await;
            ctx.reply_with_auth(chat_id, LOGGED_OUT).await?;
        }
        Ok(false) => {
            ctx.reply_text(chat_id, LOGOUT_FAILED).await?;
        }
        Err(e) => {
            tracing::error!("❌ Logout failed for user {}: {}", sender.id, e);
            ctx.reply_text(chat_id, format!("❌ Error: {}", e)).await?;
        }
    }
    Ok(())
}

/// 非指令的文字訊息
pub async fn text_message(ctx: &BotContext, chat_id: ChatId, sender: &Sender, text: &str) -> Result<()> {
    if !ctx.is_registered(sender.id).await? {
        ctx.reply_with_auth(chat_id, NOT_REGISTERED).await?;
        return Ok(());
    }

    match &ctx.assistant {
        Some(assistant) => ai_message(ctx, assistant, chat_id, sender, text.trim()).await,
        None => {
            ctx.reply_text(chat_id, USE_BUTTONS).await?;
            Ok(())
        }
    }
}

async fn ai_message(
    ctx: &BotContext,
    assistant: &AiAssistant,
    chat_id: ChatId,
    sender: &Sender,
    text: &str,
) -> Result<()> {
    let preview: String = text.chars().take(50).collect();
    tracing::info!("💬 User {} asked AI: {}...", sender.id, preview);

    match answer(ctx, assistant, chat_id, sender, text).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("❌ AI processing error for user {}: {}", sender.id, e);
            ctx.reply_text(chat_id, TECHNICAL_ERROR).await?;
            Ok(())
        }
    }
}

/// 先試知識庫，沒有結果再走一般對話
async fn answer(
    ctx: &BotContext,
    assistant: &AiAssistant,
    chat_id: ChatId,
    sender: &Sender,
    text: &str,
) -> Result<()> {
    ctx.messenger.send_typing(chat_id).await?;
    let history = ctx.sessions.history(sender.id).await;

    let mut response = None;
    if let Some(rag) = &ctx.rag {
        match rag.engine.process_query(text, sender.id, &history).await {
            Some(answer) => {
                tracing::info!("📚 RAG used for user {}, chunks: {}", sender.id, answer.chunks_used);
                response = Some(answer.response);
            }
            None => tracing::info!("RAG fallback for user {}, using regular AI", sender.id),
        }
    }

    let response = match response.filter(|r| !r.is_empty()) {
        Some(response) => response,
        None => {
            assistant
                .get_response(text, sender.id, &history, PromptMode::Plain)
                .await
        }
    };

    ctx.sessions.record_exchange(sender.id, text, &response).await;
    ctx.reply_text(chat_id, response).await?;
    Ok(())
}
