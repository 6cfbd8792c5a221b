//! Search Commands - 检索相关命令

use serde::Serialize;

use crate::domain::TrackRecord;

/// 按关键词检索并返回可播放曲目
#[derive(Debug, Clone)]
pub struct SearchMusicCommand {
    pub keyword: String,
}

impl SearchMusicCommand {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }
}

/// 检索响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMusicResponse {
    pub success: bool,
    pub result: Vec<TrackRecord>,
    pub next_tools: Vec<String>,
}

/// 调用方拿到结果后的下一步工具
pub const NEXT_TOOL_PLAY: &str = "self.music.play";

/// 清理缓存命令
#[derive(Debug, Clone, Copy)]
pub struct ClearCacheCommand {
    /// 只清理过期条目（以及损坏的条目）
    pub expired_only: bool,
}

/// 清理缓存响应
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}
