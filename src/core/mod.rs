pub mod assistant;
pub mod bot;
pub mod dispatcher;
pub mod embedding;
pub mod extract;
pub mod handlers;
pub mod keyboard;
pub mod rag_engine;
pub mod rag_system;
pub mod session;
pub mod text_splitter;
pub mod uploader;

pub use crate::domain::model::{RagAnswer, UploadReport};
pub use crate::domain::ports::{ChatModel, Embedder, KnowledgeStore, Messenger, UpdateSource, UserStore};
pub use crate::utils::error::Result;
