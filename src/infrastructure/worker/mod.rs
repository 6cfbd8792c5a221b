//! Worker Layer - Background Task Processing
//!
//! 实现 UploadWorker，处理曲目上传

mod upload_worker;

pub use upload_worker::{UploadQueue, UploadStats, UploadWorker, UploadWorkerConfig};
