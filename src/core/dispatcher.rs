use crate::core::handlers::{admin, callback, knowledge, user, BotContext};
use crate::domain::model::InboundEvent;
use crate::utils::error::Result;

/// 把事件分派給對應的處理函式
#[derive(Clone)]
pub struct Dispatcher {
    ctx: BotContext,
}

impl Dispatcher {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// 處理單一事件；錯誤只記錄，不會往上傳
    pub async fn dispatch(&self, event: InboundEvent) {
        let user_id = event.sender().id;
        if let Err(e) = self.route(event).await {
            tracing::error!("❌ Update from user {} failed: {} ({:?})", user_id, e, e.severity());
        }
    }

    async fn route(&self, event: InboundEvent) -> Result<()> {
        let ctx = &self.ctx;
        match event {
            InboundEvent::Command {
                chat_id,
                sender,
                name,
                args,
            } => match name.as_str() {
                "start" => user::start(ctx, chat_id, &sender).await,
                "exit" => user::logout(ctx, chat_id, &sender).await,
                "add_wl" => admin::add_to_white_list(ctx, chat_id, &sender, &args).await,
                "remove_wl" => admin::remove_from_white_list(ctx, chat_id, &sender, &args).await,
                "show_wl" => admin::show_white_list(ctx, chat_id, &sender).await,
                "check_wl" => admin::check_white_list(ctx, chat_id, &sender, &args).await,
                "wl_help" => admin::white_list_help(ctx, chat_id, &sender).await,
                "rag_stats" | "rag_docs" | "rag_delete" if ctx.rag.is_some() => match name.as_str() {
                    "rag_stats" => knowledge::stats(ctx, chat_id, &sender).await,
                    "rag_docs" => knowledge::documents(ctx, chat_id, &sender).await,
                    _ => knowledge::delete_document(ctx, chat_id, &sender, &args).await,
                },
                other => {
                    tracing::debug!("Ignoring command /{} from {}", other, sender.id);
                    Ok(())
                }
            },
            InboundEvent::Text { chat_id, sender, text } => user::text_message(ctx, chat_id, &sender, &text).await,
            InboundEvent::Document {
                chat_id,
                sender,
                file_id,
                file_name,
            } => {
                if ctx.rag.is_none() {
                    tracing::debug!("Ignoring document from {}: knowledge base disabled", sender.id);
                    return Ok(());
                }
                knowledge::upload_document(ctx, chat_id, &sender, &file_id, file_name.as_deref()).await
            }
            InboundEvent::Callback {
                callback_id,
                chat_id,
                sender,
                data,
            } => {
                if !callback::is_handled(&data) {
                    tracing::debug!("Ignoring callback {} from {}", data, sender.id);
                    return Ok(());
                }
                callback::button(ctx, &callback_id, chat_id, &sender, &data).await
            }
        }
    }
}
