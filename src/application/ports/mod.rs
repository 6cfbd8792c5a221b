//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod http_transport;
mod page_parser;
mod response_cache;
mod track_uploader;

pub use http_transport::{
    HttpRequest, HttpResponse, HttpTransportPort, RequestBody, TransportError,
};
pub use page_parser::PageParserPort;
pub use response_cache::{
    derive_cache_key, is_body_bearing, now_timestamp, CacheEntry, CacheError, CacheKey,
    CacheLookup, ResponseCachePort,
};
pub use track_uploader::{TrackUploaderPort, UploadError, UploadQueuePort};
