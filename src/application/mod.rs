//! Application Layer - 应用层
//!
//! - Ports: 出站端口（HTTP、响应缓存、页面解析、上传）
//! - Services: 带缓存的 HTTP 调用与检索流程
//! - Commands: 对外暴露的检索与缓存维护操作

pub mod commands;
pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
