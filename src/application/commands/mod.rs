//! 应用层 - 命令
//!
//! 工具调用边界上暴露的操作

mod search_commands;

pub mod handlers;

pub use search_commands::*;
