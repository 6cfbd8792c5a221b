//! TuneScout - 按关键词检索可播放曲目
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Track Context: 搜索结果、播放数据、曲目记录、检索错误
//! - Intent: 歌手/歌名意图识别与选曲
//!
//! 应用层 (application/):
//! - Ports: HTTP、响应缓存、页面解析、上传
//! - Services: CachedFetcher（缓存 + 过期兜底）、MusicSearchService
//! - Commands: 检索与缓存维护
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: reqwest HTTP、页面解析器、OpenList 上传
//! - Persistence: 文件响应缓存
//! - Worker: 后台上传队列

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
