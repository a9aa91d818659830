pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;
pub use config::BotConfig;

pub use core::{bot::BotEngine, dispatcher::Dispatcher, handlers::BotContext};
pub use utils::error::{BotError, Result};
