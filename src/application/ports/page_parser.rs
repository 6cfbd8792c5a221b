//! Page Parser Port - 页面结构提取
//!
//! 所有与上游页面标记相关的细节都隔离在实现中，
//! 应用层只依赖这里的结构化输出

use crate::domain::{SongListing, TrackPlayInfo};

/// Page Parser Port
pub trait PageParserPort: Send + Sync {
    /// 从搜索结果页提取歌曲列表
    ///
    /// 缺字段的条目被跳过；找不到结果容器时返回空列表
    fn parse_listing(&self, html: &str) -> Vec<SongListing>;

    /// 从播放页提取内嵌数据并合并歌词
    ///
    /// 没有任何脚本块包含可解析的 JSON 时返回 None
    fn parse_track_page(&self, html: &str) -> Option<TrackPlayInfo>;
}
