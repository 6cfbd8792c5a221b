//! Track Uploader Port - 曲目持久化
//!
//! 检索成功后的曲目由后台 worker 交给这里上传，结果不会回流到检索结果中

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TrackRecord;

/// 上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upload rejected for {path}: {reason}")]
    Rejected { path: String, reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Track Uploader Port
#[async_trait]
pub trait TrackUploaderPort: Send + Sync {
    /// 上传音频、元信息以及歌词（如果有）
    async fn upload(&self, track: &TrackRecord) -> Result<(), UploadError>;
}

/// 上传队列（发送端）
///
/// 投递不阻塞检索流程；队列满或已关闭时丢弃并返回 false
pub trait UploadQueuePort: Send + Sync {
    fn enqueue(&self, track: TrackRecord) -> bool;
}
