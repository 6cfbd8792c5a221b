//! 应用层 - 服务
//!
//! 带缓存的 HTTP 调用与检索流程编排

mod cached_fetcher;
mod music_search;

pub use cached_fetcher::{CachePolicy, CachedFetcher, FetchError, DEFAULT_MAX_AGE, DEFAULT_TIMEOUT};
pub use music_search::{
    browser_headers, MusicSearchService, SearchOutcome, DEFAULT_BASE_URL, DEFAULT_USER_AGENT,
};
