//! File Response Cache - 文件系统 HTTP 响应缓存
//!
//! 每个缓存身份对应 `<root>/<key>.json`，查找只需一次 stat/read，无索引

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::application::ports::{
    CacheEntry, CacheError, CacheKey, CacheLookup, ResponseCachePort,
};

/// 缓存子目录名
pub const CACHE_SUBDIR: &str = "http_cache";

/// 文件系统响应缓存
pub struct FileResponseCache {
    /// 缓存目录（已包含 `http_cache`）
    cache_dir: PathBuf,
}

impl FileResponseCache {
    /// 在 `root/http_cache` 下创建缓存
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache_dir = root.as_ref().join(CACHE_SUBDIR);

        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        tracing::info!(cache_dir = %cache_dir.display(), "FileResponseCache initialized");

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    async fn read_entry(path: &Path) -> Result<CacheEntry, CacheError> {
        let data = fs::read(path)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        Self::decode_entry(path, &data)
    }

    fn decode_entry(path: &Path, data: &[u8]) -> Result<CacheEntry, CacheError> {
        serde_json::from_slice(data).map_err(|e| CacheError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// 删除单个缓存文件，失败只记日志
    async fn remove_entry(path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                false
            }
        }
    }

    /// 列出缓存目录下所有 `.json` 文件
    async fn entry_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                files.push(path);
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl ResponseCachePort for FileResponseCache {
    async fn get(&self, key: &CacheKey, max_age: Duration) -> Option<CacheLookup> {
        let path = self.entry_path(key);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(cache_key = %key, "Cache file not found");
                return None;
            }
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Failed to read cache file");
                return None;
            }
        };

        match Self::decode_entry(&path, &data) {
            Ok(entry) => {
                let lookup = CacheLookup::evaluate(entry, max_age);
                if lookup.fresh {
                    tracing::debug!(
                        cache_key = %key,
                        remaining_secs = max_age.saturating_sub(lookup.age).as_secs(),
                        "Cache hit"
                    );
                } else {
                    tracing::debug!(
                        cache_key = %key,
                        age_secs = lookup.age.as_secs(),
                        "Cache entry expired"
                    );
                }
                Some(lookup)
            }
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    async fn set(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(key);

        let data = serde_json::to_vec_pretty(entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        fs::write(&path, data)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        tracing::debug!(cache_key = %key, url = %entry.url, "Cache entry saved");
        Ok(())
    }

    async fn clear_all(&self) -> Result<usize, CacheError> {
        let mut count = 0;
        for path in self.entry_files().await? {
            if Self::remove_entry(&path).await {
                count += 1;
            }
        }

        tracing::info!(count = count, "Cleared cache entries");
        Ok(count)
    }

    async fn clear_expired(&self, max_age: Duration) -> Result<usize, CacheError> {
        let mut count = 0;
        for path in self.entry_files().await? {
            let expired = match Self::read_entry(&path).await {
                Ok(entry) => entry.age() > max_age,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Removing unreadable cache entry");
                    true
                }
            };

            if expired && Self::remove_entry(&path).await {
                count += 1;
            }
        }

        tracing::info!(count = count, "Cleared expired cache entries");
        Ok(count)
    }
}
