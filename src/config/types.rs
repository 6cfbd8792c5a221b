//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::infrastructure::adapters::DEFAULT_TOKEN_PATH;
use crate::infrastructure::persistence::CACHE_SUBDIR;

/// 缓存目录环境变量（未配置 `cache.dir` 时使用）
pub const CACHE_DIR_ENV: &str = "CACHE_DIR";

/// OpenList 地址环境变量（未配置 `upload.base_url` 时使用）
pub const OPENLIST_BASE_URL_ENV: &str = "OPENLIST_BASE_URL";

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 上游站点配置
    #[serde(default)]
    pub site: SiteConfig,

    /// 响应缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 上传配置
    #[serde(default)]
    pub upload: UploadConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 上游站点配置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// 站点根地址
    #[serde(default = "default_site_base_url")]
    pub base_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_site_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 未设置时使用 `{base_url}/`
    #[serde(default)]
    pub referer: Option<String>,
}

fn default_site_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_site_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_base_url(),
            timeout_secs: default_site_timeout(),
            user_agent: default_user_agent(),
            referer: None,
        }
    }
}

impl SiteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 响应缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存根目录，`http_cache` 子目录总会追加在其后
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// 缓存有效期（秒）
    #[serde(default = "default_cache_max_age")]
    pub max_age_secs: u64,

    /// 启动时清理过期条目
    #[serde(default)]
    pub sweep_on_start: bool,
}

fn default_cache_max_age() -> u64 {
    86400 // 24 小时
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_age_secs: default_cache_max_age(),
            sweep_on_start: false,
        }
    }
}

impl CacheConfig {
    /// 缓存根目录：`cache.dir` → `$CACHE_DIR` → 系统临时目录
    pub fn root_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .or_else(|| {
                std::env::var_os(CACHE_DIR_ENV)
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(std::env::temp_dir)
    }

    /// 实际存放缓存文件的目录
    pub fn cache_dir(&self) -> PathBuf {
        self.root_dir().join(CACHE_SUBDIR)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

/// 上传配置
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// 是否在检索后上传曲目
    #[serde(default)]
    pub enabled: bool,

    /// OpenList 服务地址
    #[serde(default)]
    pub base_url: Option<String>,

    /// 令牌文件路径
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// 远程根目录
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    /// 上传队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 退出时等待队列排空的时间（秒）
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_token_path() -> PathBuf {
    PathBuf::from(DEFAULT_TOKEN_PATH)
}

fn default_remote_root() -> String {
    "/music".to_string()
}

fn default_queue_capacity() -> usize {
    32
}

fn default_shutdown_grace() -> u64 {
    30
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            token_path: default_token_path(),
            remote_root: default_remote_root(),
            queue_capacity: default_queue_capacity(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl UploadConfig {
    /// OpenList 地址：`upload.base_url` → `$OPENLIST_BASE_URL`
    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| std::env::var(OPENLIST_BASE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
