//! OpenList Uploader - 把曲目保存到 OpenList (AList)
//!
//! 实现 TrackUploaderPort trait：
//! 1. 下载音频
//! 2. 上传 `<root>/<artist>/<title>.json`（不含播放地址和歌词的元信息）
//! 3. 上传 `<root>/<artist>/<title>.mp3`
//! 4. 有歌词时上传 `<root>/<artist>/<title>.lrc`
//!
//! 上传接口：`PUT {base_url}/api/fs/put`，`File-Path` 头为 URL 编码后的远程路径

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::token_store::TokenStore;
use crate::application::ports::{TrackUploaderPort, UploadError};
use crate::domain::TrackRecord;

/// OpenList 上传配置
#[derive(Debug, Clone)]
pub struct OpenListUploaderConfig {
    /// OpenList 服务地址
    pub base_url: String,
    /// 远程根目录
    pub remote_root: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl OpenListUploaderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            remote_root: "/music".to_string(),
            timeout_secs: 60,
        }
    }

    pub fn with_remote_root(mut self, root: impl Into<String>) -> Self {
        self.remote_root = root.into();
        self
    }
}

/// 上传的元信息文件内容
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackMetadata<'a> {
    title: &'a str,
    artist: &'a str,
    artwork_url: &'a str,
}

/// OpenList 通用响应
#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

/// OpenList Uploader
pub struct OpenListUploader {
    client: Client,
    config: OpenListUploaderConfig,
    tokens: TokenStore,
}

impl OpenListUploader {
    pub fn new(config: OpenListUploaderConfig, tokens: TokenStore) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    fn put_url(&self) -> String {
        format!("{}/api/fs/put", self.config.base_url.trim_end_matches('/'))
    }

    /// 远程路径前缀 `<root>/<artist>/<title>`
    fn base_path(&self, track: &TrackRecord) -> String {
        remote_base_path(&self.config.remote_root, track)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UploadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::DownloadFailed(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UploadError::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn put_file(
        &self,
        token: &str,
        remote_path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), UploadError> {
        let size = data.len();
        let response = self
            .client
            .put(self.put_url())
            .header("Authorization", token)
            .header("File-Path", urlencoding::encode(remote_path).into_owned())
            .header("As-Task", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(data)
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                path: remote_path.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let api: ApiResponse = response
            .json()
            .await
            .map_err(|e| UploadError::SerializationError(e.to_string()))?;
        if api.code != 200 {
            return Err(UploadError::Rejected {
                path: remote_path.to_string(),
                reason: format!("code {}: {}", api.code, api.message),
            });
        }

        tracing::info!(remote_path = %remote_path, size = size, "File uploaded");
        Ok(())
    }
}

/// 远程路径前缀，空歌手/歌名使用占位名
pub fn remote_base_path(root: &str, track: &TrackRecord) -> String {
    let artist = match track.artist.trim() {
        "" => "未知",
        artist => artist,
    };
    let title = match track.title.trim() {
        "" => TrackRecord::UNKNOWN_TITLE,
        title => title,
    };
    format!("{}/{}/{}", root.trim_end_matches('/'), artist, title)
}

#[async_trait]
impl TrackUploaderPort for OpenListUploader {
    async fn upload(&self, track: &TrackRecord) -> Result<(), UploadError> {
        let token = self.tokens.load().await.ok_or_else(|| {
            UploadError::Unauthorized(format!(
                "no valid token at {}",
                self.tokens.path().display()
            ))
        })?;

        let base_path = self.base_path(track);
        tracing::info!(base_path = %base_path, "Saving track");

        let audio = self.download(&track.url).await?;
        tracing::debug!(size = audio.len(), "Audio downloaded");

        let metadata = serde_json::to_vec_pretty(&TrackMetadata {
            title: &track.title,
            artist: &track.artist,
            artwork_url: &track.artwork_url,
        })
        .map_err(|e| UploadError::SerializationError(e.to_string()))?;

        self.put_file(&token, &format!("{}.json", base_path), "application/json", metadata)
            .await?;
        self.put_file(&token, &format!("{}.mp3", base_path), "audio/mpeg", audio)
            .await?;

        if !track.lrc_text.is_empty() {
            self.put_file(
                &token,
                &format!("{}.lrc", base_path),
                "text/plain; charset=utf-8",
                track.lrc_text.clone().into_bytes(),
            )
            .await?;
        }

        tracing::info!(artist = %track.artist, title = %track.title, "Track saved");
        Ok(())
    }
}
