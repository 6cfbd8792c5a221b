//! Upload Worker - 后台曲目上传
//!
//! 有界队列 + 单个消费者。所有 [`UploadQueue`] 被丢弃后队列关闭，
//! worker 处理完已排队的曲目后退出。

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::application::ports::{TrackUploaderPort, UploadQueuePort};
use crate::domain::TrackRecord;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct UploadWorkerConfig {
    /// 队列容量
    pub queue_capacity: usize,
}

impl Default for UploadWorkerConfig {
    fn default() -> Self {
        Self { queue_capacity: 32 }
    }
}

/// 上传统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub uploaded: usize,
    pub failed: usize,
}

/// 上传队列发送端
#[derive(Clone)]
pub struct UploadQueue {
    sender: mpsc::Sender<TrackRecord>,
}

impl UploadQueuePort for UploadQueue {
    fn enqueue(&self, track: TrackRecord) -> bool {
        let title = track.title.clone();
        match self.sender.try_send(track) {
            Ok(()) => {
                tracing::debug!(title = %title, "Track queued for upload");
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(title = %title, "Upload queue full, dropping track");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(title = %title, "Upload queue closed, dropping track");
                false
            }
        }
    }
}

/// 上传 Worker
pub struct UploadWorker {
    queue_receiver: mpsc::Receiver<TrackRecord>,
    uploader: Arc<dyn TrackUploaderPort>,
}

impl UploadWorker {
    /// 创建队列与对应的 worker
    pub fn channel(
        config: UploadWorkerConfig,
        uploader: Arc<dyn TrackUploaderPort>,
    ) -> (UploadQueue, Self) {
        let (sender, queue_receiver) = mpsc::channel(config.queue_capacity.max(1));
        (
            UploadQueue { sender },
            Self {
                queue_receiver,
                uploader,
            },
        )
    }

    /// 启动 Worker，队列关闭且排空后返回
    pub async fn run(mut self) -> UploadStats {
        tracing::info!("UploadWorker started");

        let mut stats = UploadStats::default();
        while let Some(track) = self.queue_receiver.recv().await {
            match self.uploader.upload(&track).await {
                Ok(()) => {
                    stats.uploaded += 1;
                    tracing::info!(artist = %track.artist, title = %track.title, "Track uploaded");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(
                        artist = %track.artist,
                        title = %track.title,
                        error = %e,
                        "Track upload failed"
                    );
                }
            }
        }

        tracing::info!(uploaded = stats.uploaded, failed = stats.failed, "UploadWorker stopped");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::UploadError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingUploader {
        uploaded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TrackUploaderPort for RecordingUploader {
        async fn upload(&self, track: &TrackRecord) -> Result<(), UploadError> {
            if track.title == "fail" {
                return Err(UploadError::NetworkError("boom".to_string()));
            }
            self.uploaded.lock().unwrap().push(track.title.clone());
            Ok(())
        }
    }

    fn track(title: &str) -> TrackRecord {
        TrackRecord {
            url: "https://cdn.example.com/a.mp3".to_string(),
            title: title.to_string(),
            artist: "周杰伦".to_string(),
            artwork_url: String::new(),
            lrc_text: String::new(),
            lrc_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_worker_drains_queue_after_close() {
        let uploader = Arc::new(RecordingUploader::default());
        let (queue, worker) = UploadWorker::channel(UploadWorkerConfig::default(), uploader.clone());

        assert!(queue.enqueue(track("晴天")));
        assert!(queue.enqueue(track("fail")));
        assert!(queue.enqueue(track("稻香")));
        drop(queue);

        let stats = worker.run().await;
        assert_eq!(stats, UploadStats { uploaded: 2, failed: 1 });
        assert_eq!(*uploader.uploaded.lock().unwrap(), vec!["晴天", "稻香"]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let uploader = Arc::new(RecordingUploader::default());
        let (queue, worker) =
            UploadWorker::channel(UploadWorkerConfig { queue_capacity: 1 }, uploader.clone());

        assert!(queue.enqueue(track("一")));
        assert!(!queue.enqueue(track("二")));
        drop(queue);

        assert_eq!(worker.run().await.uploaded, 1);
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone() {
        let uploader = Arc::new(RecordingUploader::default());
        let (queue, worker) = UploadWorker::channel(UploadWorkerConfig::default(), uploader);
        drop(worker);

        assert!(!queue.enqueue(track("晴天")));
    }
}
