//! Music Search Service - 检索流程编排
//!
//! 关键词 → 搜索页（缓存）→ 解析列表 → 意图识别选曲 →
//! 播放页（不缓存）→ 解析播放数据 → 播放地址（不缓存）

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::cached_fetcher::{CachePolicy, CachedFetcher};
use crate::application::ports::{HttpRequest, PageParserPort, RequestBody};
use crate::domain::{
    resolve_listing, PlayUrlResult, SearchError, SongListing, TrackPlayInfo,
};

/// 默认上游站点
pub const DEFAULT_BASE_URL: &str = "https://www.gequbao.com";

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

/// 一次完整检索的结果
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// 被选中的搜索结果
    pub listing: SongListing,
    /// 播放页数据
    pub info: TrackPlayInfo,
    /// 播放地址接口响应
    pub play_url: PlayUrlResult,
}

/// 浏览器风格的默认请求头
pub fn browser_headers(base_url: &str, user_agent: &str) -> BTreeMap<String, String> {
    let referer = format!("{}/", base_url.trim_end_matches('/'));
    [
        ("accept", "*"),
        ("accept-language", "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        ("cache-control", "max-age=0"),
        ("priority", "u=0, i"),
        ("referer", referer.as_str()),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "same-origin"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
        ("user-agent", user_agent),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Music Search Service
pub struct MusicSearchService {
    fetcher: CachedFetcher,
    parser: Arc<dyn PageParserPort>,
    base_url: String,
    headers: BTreeMap<String, String>,
    rng: Mutex<StdRng>,
}

impl MusicSearchService {
    pub fn new(
        fetcher: CachedFetcher,
        parser: Arc<dyn PageParserPort>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let headers = browser_headers(&base_url, DEFAULT_USER_AGENT);
        Self {
            fetcher,
            parser,
            base_url,
            headers,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 替换随机源（测试中使用固定种子）
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        let mut request = request;
        for (name, value) in &self.headers {
            request
                .headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 搜索歌曲列表（搜索页走缓存）
    pub async fn search_listings(&self, keyword: &str) -> Result<Vec<SongListing>, SearchError> {
        let path = format!("/s/{}", urlencoding::encode(keyword));
        let request = self.request(HttpRequest::get(self.url(&path)));

        let response = self.fetcher.fetch(&request, CachePolicy::Default).await?;
        let listings = self.parser.parse_listing(response.text());

        tracing::info!(keyword = %keyword, count = listings.len(), "Search results parsed");
        Ok(listings)
    }

    /// 获取播放页数据（不缓存）
    pub async fn fetch_track_info(&self, link: &str) -> Result<Option<TrackPlayInfo>, SearchError> {
        let request = self.request(HttpRequest::get(self.url(link)));
        let response = self.fetcher.fetch(&request, CachePolicy::Bypass).await?;
        Ok(self.parser.parse_track_page(response.text()))
    }

    /// 获取播放地址（不缓存，地址可能与会话绑定）
    pub async fn fetch_play_url(&self, play_id: &str) -> Result<PlayUrlResult, SearchError> {
        let request = self.request(
            HttpRequest::post(self.url("/api/play-url"))
                .with_body(RequestBody::form([("id", play_id)])),
        );
        let response = self.fetcher.fetch(&request, CachePolicy::Bypass).await?;
        response
            .json::<PlayUrlResult>()
            .map_err(|e| SearchError::InvalidPlayUrl(e.to_string()))
    }

    /// 完整检索
    pub async fn search(&self, keyword: &str) -> Result<SearchOutcome, SearchError> {
        let listings = self.search_listings(keyword).await?;

        let listing = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            resolve_listing(keyword, &listings, &mut *rng)?.clone()
        };

        let info = self
            .fetch_track_info(&listing.link)
            .await?
            .ok_or(SearchError::TrackUnavailable)?;

        let play_id = info.play_id().ok_or_else(|| {
            tracing::error!(link = %listing.link, "Track page has no play_id");
            SearchError::TrackUnavailable
        })?;

        let play_url = self.fetch_play_url(&play_id).await?;

        tracing::info!(
            keyword = %keyword,
            title = %listing.title,
            artist = %listing.artist,
            play_id = %play_id,
            "Search completed"
        );

        Ok(SearchOutcome {
            listing,
            info,
            play_url,
        })
    }
}
