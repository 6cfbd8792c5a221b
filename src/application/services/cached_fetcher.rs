//! Cached Fetcher - 带缓存与过期兜底的 HTTP 调用
//!
//! 流程：查缓存 → 新鲜则直接返回 → 否则请求网络 → 成功写缓存 →
//! 网络失败时若有过期条目则返回过期条目

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::application::ports::{
    derive_cache_key, CacheEntry, CacheLookup, HttpRequest, HttpResponse, HttpTransportPort,
    ResponseCachePort, TransportError,
};
use crate::domain::SearchError;

/// 默认缓存有效期：24 小时
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// 默认请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// 获取错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// 网络失败且没有可用的过期缓存
    #[error("网络请求失败 {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// 上游返回非 2xx，不走过期兜底
    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },
}

impl From<FetchError> for SearchError {
    fn from(err: FetchError) -> Self {
        SearchError::Upstream(err.to_string())
    }
}

/// 单次调用的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// 不读也不写缓存（会话相关的接口）
    Bypass,
    /// 使用 fetcher 的默认有效期
    Default,
    /// 使用指定有效期
    MaxAge(Duration),
}

/// Cached Fetcher
pub struct CachedFetcher {
    transport: Arc<dyn HttpTransportPort>,
    cache: Arc<dyn ResponseCachePort>,
    default_max_age: Duration,
    timeout: Duration,
}

impl CachedFetcher {
    pub fn new(transport: Arc<dyn HttpTransportPort>, cache: Arc<dyn ResponseCachePort>) -> Self {
        Self {
            transport,
            cache,
            default_max_age: DEFAULT_MAX_AGE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.default_max_age = max_age;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 发送请求
    pub async fn fetch(
        &self,
        request: &HttpRequest,
        policy: CachePolicy,
    ) -> Result<HttpResponse, FetchError> {
        let url = request.full_url().map_err(|source| FetchError::Transport {
            url: request.url.clone(),
            source,
        })?;

        let max_age = match policy {
            CachePolicy::Bypass => None,
            CachePolicy::Default => Some(self.default_max_age),
            CachePolicy::MaxAge(max_age) => Some(max_age),
        };

        // 身份只在使用缓存时推导
        let cache_key = max_age.map(|_| derive_cache_key(&request.method, &url, request.body.as_ref()));

        let mut stale: Option<CacheLookup> = None;
        if let (Some(key), Some(max_age)) = (&cache_key, max_age) {
            match self.cache.get(key, max_age).await {
                Some(lookup) if lookup.fresh => {
                    tracing::info!(
                        url = %url,
                        cache_key = %key,
                        age_secs = lookup.age.as_secs(),
                        "Serving fresh cache entry"
                    );
                    return Ok(lookup.entry.to_response());
                }
                Some(lookup) => {
                    tracing::info!(
                        url = %url,
                        cache_key = %key,
                        age_secs = lookup.age.as_secs(),
                        "Cache entry expired, trying network"
                    );
                    stale = Some(lookup);
                }
                None => {
                    tracing::debug!(url = %url, cache_key = %key, "Cache miss");
                }
            }
        }

        tracing::info!(method = %request.method, url = %url, "Sending request");

        let result = match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };

        match result {
            Ok(response) if response.is_success() => {
                tracing::info!(url = %url, status = response.status, "Request succeeded");
                if let Some(key) = &cache_key {
                    let entry = CacheEntry::from_response(&request.method, &url, &response);
                    if let Err(e) = self.cache.set(key, &entry).await {
                        tracing::error!(url = %url, cache_key = %key, error = %e, "Failed to save cache entry");
                    }
                }
                Ok(response)
            }
            Ok(response) => {
                tracing::error!(url = %url, status = response.status, "Upstream returned error status");
                Err(FetchError::UpstreamStatus {
                    url,
                    status: response.status,
                })
            }
            Err(source) => {
                tracing::error!(url = %url, error = %source, "Network request failed");
                match stale {
                    Some(lookup) => {
                        tracing::warn!(
                            url = %url,
                            age_secs = lookup.age.as_secs(),
                            "Network failed, serving stale cache entry"
                        );
                        Ok(lookup.entry.to_response())
                    }
                    None => Err(FetchError::Transport { url, source }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{now_timestamp, CacheError, CacheKey, RequestBody};
    use crate::infrastructure::adapters::FakeTransport;
    use crate::infrastructure::persistence::FileResponseCache;
    use http::Method;
    use tempfile::{tempdir, TempDir};

    const URL: &str = "https://www.gequbao.com/s/abc";

    async fn setup(transport: FakeTransport) -> (TempDir, Arc<FakeTransport>, Arc<FileResponseCache>, CachedFetcher) {
        let dir = tempdir().unwrap();
        let cache = Arc::new(FileResponseCache::new(dir.path()).await.unwrap());
        let transport = Arc::new(transport);
        let fetcher = CachedFetcher::new(transport.clone(), cache.clone())
            .with_max_age(Duration::from_secs(60))
            .with_timeout(Duration::from_millis(200));
        (dir, transport, cache, fetcher)
    }

    async fn seed(cache: &FileResponseCache, request: &HttpRequest, body: &str, age_secs: f64) {
        let key = derive_cache_key(&request.method, &request.full_url().unwrap(), request.body.as_ref());
        let mut entry = CacheEntry::from_response(&request.method, URL, &HttpResponse::new(200, body));
        entry.timestamp = now_timestamp() - age_secs;
        cache.set(&key, &entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_network() {
        let (_dir, transport, cache, fetcher) =
            setup(FakeTransport::new().respond(HttpResponse::new(200, "network"))).await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "cached", 1.0).await;

        let response = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(response.body, "cached");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let (_dir, transport, cache, fetcher) =
            setup(FakeTransport::new().respond(HttpResponse::new(200, "network"))).await;
        let request = HttpRequest::get(URL);

        let response = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(response.body, "network");
        assert_eq!(transport.calls(), 1);

        let key = derive_cache_key(&Method::GET, URL, None);
        let lookup = cache.get(&key, Duration::from_secs(60)).await.unwrap();
        assert!(lookup.fresh);
        assert_eq!(lookup.entry.content, "network");

        // 第二次命中缓存
        let again = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(again.body, "network");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_refreshed_when_network_succeeds() {
        let (_dir, transport, cache, fetcher) =
            setup(FakeTransport::new().respond(HttpResponse::new(200, "fresh"))).await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "old", 3600.0).await;

        let response = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(response.body, "fresh");
        assert_eq!(transport.calls(), 1);

        let key = derive_cache_key(&Method::GET, URL, None);
        let lookup = cache.get(&key, Duration::from_secs(60)).await.unwrap();
        assert!(lookup.fresh);
        assert_eq!(lookup.entry.content, "fresh");
    }

    #[tokio::test]
    async fn test_stale_fallback_on_transport_failure() {
        let (_dir, _transport, cache, fetcher) = setup(
            FakeTransport::new().fail(TransportError::Connect("connection reset".to_string())),
        )
        .await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "stale", 3600.0).await;

        let response = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(response.body, "stale");
    }

    #[tokio::test]
    async fn test_stale_fallback_on_timeout() {
        let (_dir, _transport, cache, fetcher) = setup(
            FakeTransport::new()
                .respond(HttpResponse::new(200, "too late"))
                .with_delay(Duration::from_secs(5)),
        )
        .await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "stale", 3600.0).await;

        let response = fetcher.fetch(&request, CachePolicy::Default).await.unwrap();
        assert_eq!(response.body, "stale");
    }

    #[tokio::test]
    async fn test_transport_failure_without_cache_is_error() {
        let (_dir, _transport, _cache, fetcher) =
            setup(FakeTransport::new().fail(TransportError::Network("dns".to_string()))).await;

        let err = fetcher
            .fetch(&HttpRequest::get(URL), CachePolicy::Default)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_error_status_is_not_cached_nor_falls_back() {
        let (_dir, _transport, cache, fetcher) =
            setup(FakeTransport::new().respond(HttpResponse::new(503, "busy"))).await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "stale", 3600.0).await;

        let err = fetcher.fetch(&request, CachePolicy::Default).await.unwrap_err();
        assert!(matches!(err, FetchError::UpstreamStatus { status: 503, .. }));

        // 旧条目保持不变
        let key = derive_cache_key(&Method::GET, URL, None);
        let lookup = cache.get(&key, Duration::from_secs(60)).await.unwrap();
        assert_eq!(lookup.entry.content, "stale");
    }

    #[tokio::test]
    async fn test_bypass_neither_reads_nor_writes() {
        let (_dir, transport, cache, fetcher) =
            setup(FakeTransport::new().respond(HttpResponse::new(200, "live"))).await;
        let request = HttpRequest::post(URL).with_body(RequestBody::form([("id", "42")]));
        seed(&cache, &request, "cached", 1.0).await;

        let response = fetcher.fetch(&request, CachePolicy::Bypass).await.unwrap();
        assert_eq!(response.body, "live");
        assert_eq!(transport.calls(), 1);

        let key = derive_cache_key(&Method::POST, URL, request.body.as_ref());
        let lookup = cache.get(&key, Duration::from_secs(60)).await.unwrap();
        assert_eq!(lookup.entry.content, "cached");
    }

    #[tokio::test]
    async fn test_bypass_failure_has_no_fallback() {
        let (_dir, _transport, cache, fetcher) =
            setup(FakeTransport::new().fail(TransportError::Network("down".to_string()))).await;
        let request = HttpRequest::get(URL);
        seed(&cache, &request, "stale", 3600.0).await;

        assert!(fetcher.fetch(&request, CachePolicy::Bypass).await.is_err());
    }

    /// 读不到任何条目、写入总是失败的缓存
    struct BrokenCache;

    #[async_trait::async_trait]
    impl ResponseCachePort for BrokenCache {
        async fn get(&self, _key: &CacheKey, _max_age: Duration) -> Option<CacheLookup> {
            None
        }

        async fn set(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::IoError("disk full".to_string()))
        }

        async fn clear_all(&self) -> Result<usize, CacheError> {
            Ok(0)
        }

        async fn clear_expired(&self, _max_age: Duration) -> Result<usize, CacheError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_response() {
        let transport = Arc::new(FakeTransport::new().respond(HttpResponse::new(200, "live")));
        let fetcher = CachedFetcher::new(transport.clone(), Arc::new(BrokenCache));

        let response = fetcher
            .fetch(&HttpRequest::get(URL), CachePolicy::Default)
            .await
            .unwrap();
        assert_eq!(response.body, "live");
        assert_eq!(transport.calls(), 1);
    }
}
