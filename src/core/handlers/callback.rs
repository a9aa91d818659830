use super::BotContext;
use crate::core::keyboard::{self, CALLBACK_INFO, CALLBACK_REGISTRATION};
use crate::domain::model::{normalize_username, ChatId, RegistrationOutcome, Reply, Sender};
use crate::utils::error::Result;

pub const INFO_GUEST: &str = " *Возникли вопросы? Не знаешь,Что делать?*\n\n";
pub const INFO_MEMBER: &str = "*Возникли вопросы? Я помогу тебе найти на них ответы.*\n\
*Ознакомься с моими основными командами:*\n\
1. /exit - выход из системы\n";

/// 回呼資料是否由這裡處理
pub fn is_handled(data: &str) -> bool {
    data == CALLBACK_REGISTRATION || data == CALLBACK_INFO
}

/// `registration` 與 `info` 按鈕
pub async fn button(ctx: &BotContext, callback_id: &str, chat_id: ChatId, sender: &Sender, data: &str) -> Result<()> {
    ctx.messenger.answer_callback(callback_id).await?;
    tracing::info!("🔘 Callback: action={}, user_id={}", data, sender.id);

    if let Err(e) = handle_action(ctx, chat_id, sender, data).await {
        tracing::error!("❌ Error in callback handler: {}", e);
        ctx.reply_text(chat_id, format!("❌ Ошибка при получении данных: {}", e))
            .await?;
    }
    Ok(())
}

async fn handle_action(ctx: &BotContext, chat_id: ChatId, sender: &Sender, data: &str) -> Result<()> {
    match data {
        CALLBACK_REGISTRATION => {
            let username = normalize_username(sender.username.as_deref());
            let outcome = match ctx.users.register_user(sender.id, &username).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("❌ Registration failed for user {}: {}", sender.id, e);
                    RegistrationOutcome::InternalError
                }
            };
            let reply = if outcome.is_success() {
                Reply::text(outcome.message())
                    .keyboard(keyboard::info_keyboard())
                    .markdown()
            } else {
                Reply::text(outcome.message())
            };
            ctx.reply(chat_id, reply).await?;
        }
        CALLBACK_INFO => {
            let reply = if ctx.is_registered(sender.id).await? {
                Reply::text(INFO_MEMBER).markdown()
            } else {
                Reply::text(INFO_GUEST)
                    .keyboard(keyboard::auth_begin_keyboard())
                    .markdown()
            };
            ctx.reply(chat_id, reply).await?;
        }
        other => tracing::debug!("Ignoring callback {}", other),
    }
    Ok(())
}
