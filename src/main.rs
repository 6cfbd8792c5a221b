//! TuneScout - 按关键词检索可播放曲目
//!
//! 用法:
//! - `tunescout search <keyword>`  检索并把结果 JSON 打印到 stdout
//! - `tunescout cache clear`       清空响应缓存
//! - `tunescout cache sweep`       清理过期或损坏的缓存条目

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::task::JoinHandle;
use tunescout::application::commands::handlers::{ClearCacheHandler, SearchMusicHandler};
use tunescout::application::commands::{
    ClearCacheCommand, SearchMusicCommand, SearchMusicResponse,
};
use tunescout::application::error::ApplicationError;
use tunescout::application::ports::{ResponseCachePort, UploadQueuePort};
use tunescout::application::services::{browser_headers, CachedFetcher, MusicSearchService};
use tunescout::config::{load_config, print_config, AppConfig};
use tunescout::infrastructure::adapters::{
    GequbaoPageParser, OpenListUploader, OpenListUploaderConfig, ReqwestTransport,
    ReqwestTransportConfig, TokenStore,
};
use tunescout::infrastructure::persistence::FileResponseCache;
use tunescout::infrastructure::worker::{UploadStats, UploadWorker, UploadWorkerConfig};

enum Cli {
    Search(String),
    ClearCache { expired_only: bool },
}

fn parse_args() -> anyhow::Result<Cli> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("search") if args.len() > 1 => Ok(Cli::Search(args[1..].join(" "))),
        Some("cache") => match args.get(1).map(String::as_str) {
            Some("clear") => Ok(Cli::ClearCache { expired_only: false }),
            Some("sweep") => Ok(Cli::ClearCache { expired_only: true }),
            _ => bail!("usage: tunescout cache <clear|sweep>"),
        },
        _ => bail!("usage: tunescout search <keyword> | tunescout cache <clear|sweep>"),
    }
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},tunescout={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    // stdout 只输出结果 JSON
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 先输出检索结果，再在宽限期内等待上传排空
///
/// 返回 worker 的统计；超时或 worker 异常时返回 None，剩余曲目被丢弃
async fn emit_then_drain<W: Write>(
    out: &mut W,
    result: &Result<SearchMusicResponse, ApplicationError>,
    worker: Option<JoinHandle<UploadStats>>,
    grace: Duration,
) -> anyhow::Result<Option<UploadStats>> {
    match result {
        Ok(response) => writeln!(out, "{}", serde_json::to_string(response)?)?,
        Err(e) => writeln!(out, "{}", e)?,
    }
    out.flush()?;

    let Some(handle) = worker else {
        return Ok(None);
    };

    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(stats)) => {
            tracing::info!(uploaded = stats.uploaded, failed = stats.failed, "Uploads finished");
            Ok(Some(stats))
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Upload worker panicked");
            Ok(None)
        }
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Upload drain timed out, discarding remaining tracks"
            );
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    let cli = parse_args()?;
    print_config(&config);

    let cache: Arc<dyn ResponseCachePort> = Arc::new(
        FileResponseCache::new(config.cache.root_dir())
            .await
            .context("Failed to open response cache")?,
    );

    let keyword = match cli {
        Cli::ClearCache { expired_only } => {
            let handler = ClearCacheHandler::new(cache, config.cache.max_age());
            let response = handler.handle(ClearCacheCommand { expired_only }).await?;
            println!("{}", serde_json::to_string(&response)?);
            return Ok(());
        }
        Cli::Search(keyword) => keyword,
    };

    if config.cache.sweep_on_start {
        match cache.clear_expired(config.cache.max_age()).await {
            Ok(removed) => tracing::info!(removed = removed, "Swept expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "Cache sweep failed"),
        }
    }

    let transport = Arc::new(ReqwestTransport::new(
        ReqwestTransportConfig::default().with_timeout(config.site.timeout_secs),
    )?);
    let fetcher = CachedFetcher::new(transport, cache)
        .with_max_age(config.cache.max_age())
        .with_timeout(config.site.timeout());

    let mut headers = browser_headers(&config.site.base_url, &config.site.user_agent);
    if let Some(referer) = &config.site.referer {
        headers.insert("referer".to_string(), referer.clone());
    }
    let service = MusicSearchService::new(
        fetcher,
        Arc::new(GequbaoPageParser::new()),
        config.site.base_url.clone(),
    )
    .with_headers(headers);

    let mut handler = SearchMusicHandler::new(Arc::new(service));

    // 上传 Worker（可选）
    let mut worker_handle = None;
    if config.upload.enabled {
        let base_url = config
            .upload
            .resolved_base_url()
            .context("Upload base URL is not configured")?;
        let uploader = OpenListUploader::new(
            OpenListUploaderConfig::new(base_url).with_remote_root(config.upload.remote_root.clone()),
            TokenStore::new(&config.upload.token_path),
        )?;
        let (queue, worker) = UploadWorker::channel(
            UploadWorkerConfig {
                queue_capacity: config.upload.queue_capacity,
            },
            Arc::new(uploader),
        );
        let queue: Arc<dyn UploadQueuePort> = Arc::new(queue);
        handler = handler.with_upload_queue(queue);
        worker_handle = Some(tokio::spawn(worker.run()));
    }

    let result = handler.handle(SearchMusicCommand::new(keyword)).await;

    // 释放队列发送端，worker 排空后退出
    drop(handler);

    if let Err(e) = &result {
        tracing::error!(error = %e, "Search failed");
    }

    let mut stdout = std::io::stdout();
    emit_then_drain(&mut stdout, &result, worker_handle, config.upload.shutdown_grace()).await?;

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tunescout::domain::SearchError;

    /// 多个任务共享的输出缓冲
    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn response() -> Result<SearchMusicResponse, ApplicationError> {
        Ok(SearchMusicResponse {
            success: true,
            result: Vec::new(),
            next_tools: vec!["self.music.play".to_string()],
        })
    }

    #[tokio::test]
    async fn test_result_is_written_before_upload_drain() {
        let output = SharedOutput::default();

        // 上传只有在结果输出之后才会完成
        let seen = output.clone();
        let worker = tokio::spawn(async move {
            while seen.contents().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            UploadStats { uploaded: 1, failed: 0 }
        });

        let mut out = output.clone();
        let stats = emit_then_drain(&mut out, &response(), Some(worker), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(stats, Some(UploadStats { uploaded: 1, failed: 0 }));
        assert!(output.contents().contains("\"nextTools\":[\"self.music.play\"]"));
    }

    #[tokio::test]
    async fn test_slow_upload_does_not_hold_back_result() {
        let output = SharedOutput::default();
        let worker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            UploadStats::default()
        });

        let mut out = output.clone();
        let stats = emit_then_drain(&mut out, &response(), Some(worker), Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(stats, None);
        assert!(output.contents().contains("\"success\":true"));
    }

    #[tokio::test]
    async fn test_error_text_is_written() {
        let output = SharedOutput::default();
        let result = Err(ApplicationError::from(SearchError::no_results("zzz")));

        let mut out = output.clone();
        emit_then_drain(&mut out, &result, None, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(output.contents(), "没有搜索到关于 'zzz' 的歌曲, 请更换关键词\n");
    }
}
