//! Domain Layer - 领域层
//!
//! 曲目检索上下文与搜索意图识别

pub mod intent;
pub mod track;

pub use intent::{classify_intent, resolve_listing, SearchIntent};
pub use track::{PlayUrlResult, SearchError, SongListing, TrackPlayInfo, TrackRecord};
