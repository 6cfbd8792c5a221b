//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod search_handlers;

pub use search_handlers::*;
