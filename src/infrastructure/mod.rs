//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod persistence;
pub mod worker;

pub use adapters::{FakeTransport, GequbaoPageParser, OpenListUploader, ReqwestTransport};
pub use persistence::FileResponseCache;
pub use worker::{UploadQueue, UploadWorker, UploadWorkerConfig};
