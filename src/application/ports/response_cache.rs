//! Response Cache Port - HTTP 响应缓存
//!
//! 定义缓存身份的推导规则与缓存存储的抽象接口，
//! 具体实现使用文件系统（每个身份一个 JSON 文件）

use async_trait::async_trait;
use chrono::Utc;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use super::http_transport::{HttpResponse, RequestBody};

/// Response Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// 缓存身份（128 位 MD5 的十六进制表示）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 是否为携带请求体的方法
pub fn is_body_bearing(method: &Method) -> bool {
    matches!(
        method.as_str().to_uppercase().as_str(),
        "POST" | "PUT" | "PATCH"
    )
}

/// 推导缓存身份
///
/// `md5(METHOD | url [| body])`：
/// - GET 等方法只看方法和 URL，请求体被忽略
/// - POST/PUT/PATCH 追加规范化后的请求体，结构化请求体按 key 排序序列化
pub fn derive_cache_key(method: &Method, url: &str, body: Option<&RequestBody>) -> CacheKey {
    let mut parts = vec![method.as_str().to_uppercase(), url.to_string()];

    if is_body_bearing(method) {
        if let Some(body) = body.and_then(canonical_body) {
            parts.push(body);
        }
    }

    let key_string = parts.join("|");
    let digest = md5::compute(key_string.as_bytes());
    let key = CacheKey(format!("{:x}", digest));

    tracing::debug!(cache_key = %key, source = %key_string, "Derived cache key");
    key
}

/// 规范化请求体，空请求体返回 None
fn canonical_body(body: &RequestBody) -> Option<String> {
    match body {
        RequestBody::Form(fields) if fields.is_empty() => None,
        // BTreeMap 序列化时本身就是按 key 有序的
        RequestBody::Form(fields) => serde_json::to_string(fields).ok(),
        RequestBody::Json(value) if value.is_null() => None,
        RequestBody::Json(value) => serde_json::to_string(&sort_keys(value)).ok(),
        RequestBody::Raw(raw) if raw.is_empty() => None,
        RequestBody::Raw(raw) => Some(raw.clone()),
    }
}

/// 递归按 key 排序，不依赖 serde_json 是否启用 preserve_order
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// 缓存条目（文件内容）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 写入时间（秒，Unix 时间戳）
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, alias = "text")]
    pub content: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_status_code() -> u16 {
    200
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// 当前 Unix 时间（秒，带小数）
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl CacheEntry {
    /// 以当前时间为时间戳快照一个响应
    pub fn from_response(method: &Method, url: &str, response: &HttpResponse) -> Self {
        Self {
            timestamp: now_timestamp(),
            url: url.to_string(),
            method: method.as_str().to_uppercase(),
            status_code: response.status,
            headers: response.headers.clone(),
            content: response.body.clone(),
            encoding: response.encoding.clone(),
        }
    }

    /// 从缓存重建响应
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status_code,
            headers: self.headers.clone(),
            body: self.content.clone(),
            encoding: self.encoding.clone(),
        }
    }

    /// 条目年龄，时间戳在未来时视为 0，无法表示时视为无限久
    pub fn age(&self) -> Duration {
        Duration::try_from_secs_f64((now_timestamp() - self.timestamp).max(0.0))
            .unwrap_or(Duration::MAX)
    }
}

/// 查询结果：条目本身加新鲜度
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub entry: CacheEntry,
    pub age: Duration,
    pub fresh: bool,
}

impl CacheLookup {
    pub fn evaluate(entry: CacheEntry, max_age: Duration) -> Self {
        let age = entry.age();
        Self {
            fresh: age <= max_age,
            age,
            entry,
        }
    }

    pub fn is_stale(&self) -> bool {
        !self.fresh
    }
}

/// Response Cache Port
///
/// 一个身份只对应一个条目，写入整体覆盖旧条目
#[async_trait]
pub trait ResponseCachePort: Send + Sync {
    /// 查询条目
    ///
    /// 过期条目同样返回（`fresh = false`），由调用方决定是否作为兜底；
    /// 不存在或无法解析时返回 None
    async fn get(&self, key: &CacheKey, max_age: Duration) -> Option<CacheLookup>;

    /// 写入（覆盖）条目
    async fn set(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError>;

    /// 删除全部条目，返回删除数量
    async fn clear_all(&self) -> Result<usize, CacheError>;

    /// 删除超过 `max_age` 的条目以及无法解析的条目，返回删除数量
    async fn clear_expired(&self, max_age: Duration) -> Result<usize, CacheError>;
}
