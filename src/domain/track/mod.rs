//! Track Context - 曲目检索上下文
//!
//! 搜索结果条目、播放页数据以及最终交付给调用方的曲目记录

mod errors;
mod value_objects;

pub use errors::SearchError;
pub use value_objects::{PlayUrlResult, SongListing, TrackPlayInfo, TrackRecord};
