//! Search Command Handlers

use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::search_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{ResponseCachePort, UploadQueuePort};
use crate::application::services::MusicSearchService;
use crate::domain::{SearchError, TrackRecord};

/// SearchMusic Handler - 工具调用边界上唯一的检索操作
pub struct SearchMusicHandler {
    service: Arc<MusicSearchService>,
    upload_queue: Option<Arc<dyn UploadQueuePort>>,
}

impl SearchMusicHandler {
    pub fn new(service: Arc<MusicSearchService>) -> Self {
        Self {
            service,
            upload_queue: None,
        }
    }

    /// 检索成功后把曲目交给后台上传
    pub fn with_upload_queue(mut self, queue: Arc<dyn UploadQueuePort>) -> Self {
        self.upload_queue = Some(queue);
        self
    }

    pub async fn handle(
        &self,
        cmd: SearchMusicCommand,
    ) -> Result<SearchMusicResponse, ApplicationError> {
        let keyword = cmd.keyword.trim();
        if keyword.is_empty() {
            return Err(ApplicationError::validation("keyword cannot be empty"));
        }

        let outcome = self.service.search(keyword).await?;

        let data = outcome.play_url.data.as_ref().ok_or_else(|| {
            SearchError::InvalidPlayUrl(format!("'data' missing, code {}", outcome.play_url.code))
        })?;
        let url = data
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SearchError::InvalidPlayUrl("'url' missing in 'data'".to_string()))?;

        let record = TrackRecord::from_play_info(&outcome.info, url);

        if let Some(queue) = &self.upload_queue {
            // 上传失败只记日志，不影响本次结果
            queue.enqueue(record.clone());
        }

        tracing::info!(
            keyword = %keyword,
            title = %record.title,
            artist = %record.artist,
            "Search music handled"
        );

        Ok(SearchMusicResponse {
            success: true,
            result: vec![record],
            next_tools: vec![NEXT_TOOL_PLAY.to_string()],
        })
    }
}

/// ClearCache Handler
pub struct ClearCacheHandler {
    cache: Arc<dyn ResponseCachePort>,
    max_age: Duration,
}

impl ClearCacheHandler {
    pub fn new(cache: Arc<dyn ResponseCachePort>, max_age: Duration) -> Self {
        Self { cache, max_age }
    }

    pub async fn handle(&self, cmd: ClearCacheCommand) -> Result<ClearCacheResponse, ApplicationError> {
        let result = if cmd.expired_only {
            self.cache.clear_expired(self.max_age).await
        } else {
            self.cache.clear_all().await
        };

        // 缓存只是尽力而为，清理失败按 0 处理
        let removed = result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to clear cache");
            0
        });

        Ok(ClearCacheResponse { removed })
    }
}
