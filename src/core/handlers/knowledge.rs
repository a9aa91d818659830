use super::BotContext;
use crate::core::extract::{file_extension, SUPPORTED_EXTENSIONS};
use crate::core::rag_engine::STATUS_ACTIVE;
use crate::core::rag_system::RagComponents;
use crate::domain::model::{ChatId, KnowledgeDocument, Reply, Sender};
use crate::utils::error::Result;

pub const UPLOAD_ADMIN_ONLY: &str = "⛔ Загрузка документов доступна только администраторам.";
pub const COMMAND_ADMIN_ONLY: &str = "⛔ Команда доступна только администраторам.";
pub const RAG_NOT_INITIALIZED: &str = "❌ RAG система не инициализирована.";

/// 只有管理員能操作知識庫；通過時回傳啟用中的元件
async fn admin_rag<'a>(
    ctx: &'a BotContext,
    chat_id: ChatId,
    sender: &Sender,
    denied: &str,
) -> Result<Option<&'a RagComponents>> {
    if !ctx.is_admin(sender.id) {
        ctx.reply_text(chat_id, denied).await?;
        return Ok(None);
    }
    match &ctx.rag {
        Some(rag) => Ok(Some(rag)),
        None => {
            ctx.reply_text(chat_id, RAG_NOT_INITIALIZED).await?;
            Ok(None)
        }
    }
}

/// 上傳文件到知識庫；處理結果直接改寫狀態訊息
pub async fn upload_document(
    ctx: &BotContext,
    chat_id: ChatId,
    sender: &Sender,
    file_id: &str,
    file_name: Option<&str>,
) -> Result<()> {
    let Some(rag) = admin_rag(ctx, chat_id, sender, UPLOAD_ADMIN_ONLY).await? else {
        return Ok(());
    };

    let filename = file_name.unwrap_or("unknown");
    let extension = file_extension(filename);
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        let text = format!(
            "⚠️ Неподдерживаемый формат: .{}\nПоддерживаются: PDF, TXT, MD",
            extension
        );
        ctx.reply_text(chat_id, text).await?;
        return Ok(());
    }

    let status = ctx
        .reply_text(chat_id, format!("⏳ Обрабатываю файл: {}...", filename))
        .await?;

    let bytes = match ctx.messenger.download_file(file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("❌ Document download failed: {}", e);
            ctx.messenger
                .edit_message(&status, &format!("❌ Ошибка обработки: {}", e))
                .await?;
            return Ok(());
        }
    };

    let text = match rag.uploader.process_file(bytes, filename, sender.id).await {
        Ok(report) => {
            tracing::info!("📥 Admin {} uploaded document: {}", sender.id, filename);
            format!(
                "✅ Документ загружен!\n\n📄 Файл: {}\n📊 Создано чанков: {}\n📝 Длина текста: {} символов",
                filename, report.chunks_created, report.total_text_length
            )
        }
        Err(e) => format!("❌ Ошибка: {}", e),
    };
    ctx.messenger.edit_message(&status, &text).await?;
    Ok(())
}

/// /rag_stats
pub async fn stats(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    let Some(rag) = admin_rag(ctx, chat_id, sender, COMMAND_ADMIN_ONLY).await? else {
        return Ok(());
    };

    match rag.engine.get_stats().await {
        Ok(stats) => {
            let text = format!(
                "📊 **Статистика RAG системы**\n\n\
                 📄 Документов: {}\n\
                 📦 Чанков: {}\n\
                 🔍 Запросов сегодня: {}\n\
                 📈 Всего запросов: {}\n\
                 ✅ Статус: {}",
                stats.documents_count, stats.chunks_count, stats.queries_today, stats.total_queries, STATUS_ACTIVE
            );
            ctx.reply(chat_id, Reply::text(text).markdown()).await?;
        }
        Err(e) => {
            tracing::error!("❌ Failed to load RAG stats: {}", e);
            ctx.reply_text(chat_id, format!("❌ Ошибка: {}", e)).await?;
        }
    }
    Ok(())
}

/// 檔名去掉角括號，日期為 dd.mm.YYYY
pub fn documents_message(docs: &[KnowledgeDocument]) -> String {
    let mut text = String::from("📚 Загруженные документы:\n\n");
    for doc in docs {
        let filename = doc.filename.replace(['<', '>'], "");
        text.push_str(&format!(
            "📄 ID: {} | {}\n   Чанков: {} | Дата: {}\n\n",
            doc.id,
            filename,
            doc.total_chunks,
            doc.created_at.format("%d.%m.%Y")
        ));
    }
    text.push_str("💡 Для удаления: /rag_delete ID");
    text
}

/// /rag_docs
pub async fn documents(ctx: &BotContext, chat_id: ChatId, sender: &Sender) -> Result<()> {
    let Some(rag) = admin_rag(ctx, chat_id, sender, COMMAND_ADMIN_ONLY).await? else {
        return Ok(());
    };

    let docs = rag.uploader.documents().await;
    if docs.is_empty() {
        ctx.reply_text(chat_id, "📂 База знаний пуста. Загрузите документы.")
            .await?;
        return Ok(());
    }

    ctx.reply_text(chat_id, documents_message(&docs)).await?;
    Ok(())
}

/// /rag_delete <id>
pub async fn delete_document(ctx: &BotContext, chat_id: ChatId, sender: &Sender, args: &[String]) -> Result<()> {
    if !ctx.is_admin(sender.id) {
        ctx.reply_text(chat_id, COMMAND_ADMIN_ONLY).await?;
        return Ok(());
    }

    let Some(raw_id) = args.first() else {
        ctx.reply_text(chat_id, "❌ Использование: /rag_delete <ID документа>")
            .await?;
        return Ok(());
    };
    let Ok(document_id) = raw_id.parse::<i32>() else {
        ctx.reply_text(chat_id, "❌ ID должен быть числом.").await?;
        return Ok(());
    };

    let Some(rag) = admin_rag(ctx, chat_id, sender, COMMAND_ADMIN_ONLY).await? else {
        return Ok(());
    };

    if rag.uploader.delete_document(document_id).await {
        tracing::info!("🗑️ Admin {} deleted document ID={}", sender.id, document_id);
        ctx.reply_text(chat_id, format!("✅ Документ ID={} удалён.", document_id))
            .await?;
    } else {
        ctx.reply_text(chat_id, format!("❌ Не удалось удалить документ ID={}", document_id))
            .await?;
    }
    Ok(())
}
