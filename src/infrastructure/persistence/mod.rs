//! Persistence Layer - 数据持久化
//!
//! 文件系统响应缓存

mod file_cache;

pub use file_cache::{FileResponseCache, CACHE_SUBDIR};
