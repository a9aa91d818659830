use super::{BotContext, NO_ADMIN_RIGHTS};
use crate::domain::model::{normalize_username, ChatId, Reply, Sender};
use crate::utils::error::Result;
use std::time::Duration;

/// 超過此長度的 white list 改為分段傳送
pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const WHITE_LIST_PART_SIZE: usize = 50;
pub const PART_PAUSE: Duration = Duration::from_millis(500);

const ADD_USAGE: &str = "❌ Использование: `/add_wl @username`\n\n\
Примеры:\n\
• `/add_wl @ivanov`\n\
• `/add_wl @petrov @sidorov` - несколько пользователей";

const REMOVE_USAGE: &str = "❌ Использование: `/remove_wl @username`\n\n\
Примеры:\n\
• `/remove_wl @ivanov`\n\
• `/remove_wl @petrov @sidorov` - несколько пользователей";

const CHECK_USAGE: &str = "❌ Использование: `/check_wl @username`";

pub const WL_HELP: &str = "📋 **Команды управления White List**\n\n\
`/add_wl @username` - добавить пользователя в white list\n\
`/remove_wl @username` - удалить пользователя из white list\n\
`/show_wl` - показать всех пользователей в white list\n\
`/check_wl @username` - проверить наличие пользователя\n\
`/wl_help` - эта справка\n\n\
**Примеры:**\n\
• `/add_wl @ivanov` - добавить одного пользователя\n\
• `/add_wl @petrov @sidorov` - добавить нескольких\n\
• `/remove_wl @ivanov` - удалить пользователя";

/// 權限不足時回覆並回傳 false
async fn ensure_admin(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<bool> {
    if ctx.is_admin(sender.id) {
        return Ok(true);
    }
    tracing::warn!("⛔ User {} tried an admin command", sender.id);
    ctx.reply_text(chat_id, NO_ADMIN_RIGHTS).await?;
    Ok(false)
}

/// 成功與失敗分兩段列出
fn summary(done_title: &str, done: &[String], failed_title: &str, failed: &[String], nothing: &str) -> String {
    let mut parts = Vec::new();
    if !done.is_empty() {
        parts.push(format!("{}\n{}", done_title, done.join("\n")));
    }
    if !failed.is_empty() {
        parts.push(format!("{}\n{}", failed_title, failed.join("\n")));
    }
    if parts.is_empty() {
        parts.push(nothing.to_string());
    }
    parts.join("\n\n")
}

/// /add_wl @user...
pub async fn add_to_white_list(ctx: &BotContext, chat_id: ChatId, sender: &Sender, args: &[String]) -> Result<()> {
    if !ensure_admin(ctx, chat_id, sender).await? {
        return Ok(());
    }
    if args.is_empty() {
        ctx.reply(chat_id, Reply::text(ADD_USAGE).markdown()).await?;
        return Ok(());
    }

    let mut added = Vec::new();
    let mut failed = Vec::new();

    for arg in args {
        let username = arg.trim();
        if !username.starts_with('@') {
            let text = format!(
                "❌ Неверный формат: `{}`\nUsername должен начинаться с @ (например: @username)",
                username
            );
            ctx.reply(chat_id, Reply::text(text).markdown()).await?;
            continue;
        }

        let normalized = normalize_username(Some(username));
        if normalized.is_empty() {
            failed.push(format!("{}: ❌ Неверный username", username));
            continue;
        }

        match ctx.users.add_to_white_list(&normalized).await {
            Ok(()) => {
                tracing::info!("✅ {} added to white list by {}", username, sender.id);
                added.push(username.to_string());
            }
            Err(e) => {
                tracing::warn!("❌ Failed to add {} to white list: {}", username, e);
                failed.push(format!("{}: ❌ Ошибка: {}", username, e));
            }
        }
    }

    let text = summary(
        "✅ **Добавлен в white list:**",
        &added,
        "❌ **Не удалось добавить:**",
        &failed,
        "❌ Не указаны username для добавления.",
    );
    ctx.reply(chat_id, Reply::text(text).markdown()).await?;
    Ok(())
}

/// /remove_wl @user...
pub async fn remove_from_white_list(
    ctx: &BotContext,
    chat_id: ChatId,
    sender: &Sender,
    args: &[String],
) -> Result<()> {
    if !ensure_admin(ctx, chat_id, sender).await? {
        return Ok(());
    }
    if args.is_empty() {
        ctx.reply(chat_id, Reply::text(REMOVE_USAGE).markdown()).await?;
        return Ok(());
    }

    let mut removed = Vec::new();
    let mut failed = Vec::new();

    for arg in args {
        let username = arg.trim();
        if !username.starts_with('@') {
            let text = format!("❌ Неверный формат: `{}`", username);
            ctx.reply(chat_id, Reply::text(text).markdown()).await?;
            continue;
        }

        let normalized = normalize_username(Some(username));
        match ctx.users.remove_from_white_list(&normalized).await {
            Ok(true) => {
                tracing::info!("✅ Admin {} removed {} from white list", sender.id, username);
                removed.push(username.to_string());
            }
            Ok(false) => {
                failed.push(format!("{}: ❌ Username не найден в white list", username));
            }
            Err(e) => {
                tracing::warn!("❌ Admin {} could not remove {}: {}", sender.id, username, e);
                failed.push(format!("{}: ❌ Ошибка: {}", username, e));
            }
        }
    }

    let text = summary(
        "✅ **Удалены из white list:**",
        &removed,
        "❌ **Не удалось удалить:**",
        &failed,
        "❌ Не указаны username для удаления.",
    );
    ctx.reply(chat_id, Reply::text(text).markdown()).await?;
    Ok(())
}

/// 清單過長時切成多段，每段最多 50 筆
pub fn white_list_messages(users: &[String]) -> Vec<String> {
    let lines: Vec<String> = users
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect();

    let full = format!(
        "📋 **White list пользователей** ({}):\n\n{}",
        users.len(),
        lines.join("\n")
    );
    if full.chars().count() <= MAX_MESSAGE_CHARS {
        return vec![full];
    }

    lines
        .chunks(WHITE_LIST_PART_SIZE)
        .enumerate()
        .map(|(i, part)| format!("📋 **White list (часть {})**\n\n{}", i + 1, part.join("\n")))
        .collect()
}

/// /show_wl
pub async fn show_white_list(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    if !ensure_admin(ctx, chat_id, sender).await? {
        return Ok(());
    }

    let users = match ctx.users.white_list().await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("❌ Failed to load white list: {}", e);
            ctx.reply_text(chat_id, "❌ Произошла ошибка при получении списка.").await?;
            return Ok(());
        }
    };

    if users.is_empty() {
        ctx.reply_text(chat_id, "📭 White list пуст.").await?;
        return Ok(());
    }

    let messages = white_list_messages(&users);
    let split = messages.len() > 1;
    for text in messages {
        ctx.reply(chat_id, Reply::text(text).markdown()).await?;
        if split {
            tokio::time::sleep(PART_PAUSE).await;
        }
    }

    tracing::info!("✅ Admin {} viewed white list ({} users)", sender.id, users.len());
    Ok(())
}

/// /check_wl @user
pub async fn check_white_list(ctx: &BotContext, chat_id: ChatId, sender: &Sender, args: &[String]) -> Result<()> {
    if !ensure_admin(ctx, chat_id, sender).await? {
        return Ok(());
    }

    let Some(username) = args.first().map(|a| a.trim()) else {
        ctx.reply(chat_id, Reply::text(CHECK_USAGE).markdown()).await?;
        return Ok(());
    };
    if !username.starts_with('@') {
        let text = format!("❌ Неверный формат: `{}`", username);
        ctx.reply(chat_id, Reply::text(text).markdown()).await?;
        return Ok(());
    }

    let normalized = normalize_username(Some(username));
    let text = match ctx.users.is_white_listed(&normalized).await {
        Ok(true) => format!("✅ @{} есть в white list", normalized),
        Ok(false) => format!("❌ @{} нет в white list", normalized),
        Err(e) => {
            tracing::error!("❌ White list lookup failed for {}: {}", username, e);
            format!("❌ Ошибка: {}", e)
        }
    };
    ctx.reply_text(chat_id, text).await?;
    Ok(())
}

/// /wl_help
pub async fn white_list_help(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    if !ensure_admin(ctx, chat_id, sender).await? {
        return Ok(());
    }
    ctx.reply(chat_id, Reply::text(WL_HELP).markdown()).await?;
    Ok(())
}
