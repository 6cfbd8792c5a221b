//! Track Context - Errors

use thiserror::Error;

/// 检索错误
///
/// 这些错误的 Display 文本会原样返回给调用方
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("没有搜索到关于 '{keyword}' 的歌曲, 请更换关键词")]
    NoResults { keyword: String },

    #[error("search failed, upstream request failed: {0}")]
    Upstream(String),

    #[error("search failed, current search engine may have problems")]
    TrackUnavailable,

    #[error("search failed, invalid play url response: {0}")]
    InvalidPlayUrl(String),
}

impl SearchError {
    pub fn no_results(keyword: impl Into<String>) -> Self {
        Self::NoResults {
            keyword: keyword.into(),
        }
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NoResults { .. })
    }
}
