//! Storage Adapter - 曲目上传实现

mod openlist_uploader;
mod token_store;

pub use openlist_uploader::{remote_base_path, OpenListUploader, OpenListUploaderConfig};
pub use token_store::{token_expiry, TokenStore, DEFAULT_TOKEN_PATH};
