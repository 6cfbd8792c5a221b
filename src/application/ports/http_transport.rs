//! HTTP Transport Port - 出站 HTTP 调用抽象
//!
//! 具体实现位于 infrastructure/adapters/http（reqwest）

use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// 传输层错误
///
/// 只表示网络层面的失败；非 2xx 响应不是传输错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// 表单（application/x-www-form-urlencoded）
    Form(BTreeMap<String, String>),
    /// JSON
    Json(Value),
    /// 原始字符串
    Raw(String),
}

impl RequestBody {
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// 出站请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// 绝对 URL，不含查询参数
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// 拼接查询参数后的完整 URL，缓存身份基于它计算
    pub fn full_url(&self) -> Result<String, TransportError> {
        if self.query.is_empty() {
            return Ok(self.url.clone());
        }
        url::Url::parse_with_params(&self.url, &self.query)
            .map(String::from)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", self.url, e)))
    }

    /// 合并后的 Cookie 头
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// HTTP 响应快照（网络响应或缓存重建）
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub encoding: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
            encoding: "utf-8".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP Transport Port
#[async_trait]
pub trait HttpTransportPort: Send + Sync {
    /// 发送请求
    ///
    /// 任何状态码的响应都返回 `Ok`，超时与连接失败返回 `Err`
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
