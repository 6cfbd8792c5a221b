//! Reqwest Transport - 基于 reqwest 的 HTTP 调用
//!
//! 实现 HttpTransportPort trait，任何状态码都作为响应返回，
//! 只有超时、连接失败等网络问题才是错误

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::application::ports::{
    HttpRequest, HttpResponse, HttpTransportPort, RequestBody, TransportError,
};

/// Reqwest Transport 配置
#[derive(Debug, Clone)]
pub struct ReqwestTransportConfig {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ReqwestTransportConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl ReqwestTransportConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Reqwest Transport
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: ReqwestTransportConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn build_headers(request: &HttpRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }
        if let Some(cookie) = request.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| TransportError::InvalidRequest(format!("cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }
        Ok(headers)
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// 从 Content-Type 中取 charset，默认 utf-8
fn charset_of(headers: &BTreeMap<String, String>) -> String {
    headers
        .get(CONTENT_TYPE.as_str())
        .and_then(|ct| {
            ct.split(';')
                .filter_map(|part| part.trim().strip_prefix("charset="))
                .next()
                .map(|c| c.trim_matches('"').to_lowercase())
        })
        .unwrap_or_else(|| "utf-8".to_string())
}

#[async_trait]
impl HttpTransportPort for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(Self::build_headers(request)?);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Some(RequestBody::Form(fields)) => builder.form(fields),
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Raw(raw)) => builder.body(raw.clone()),
            None => builder,
        };

        tracing::debug!(method = %request.method, url = %request.url, "Sending HTTP request");

        let response = builder.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let encoding = charset_of(&headers);

        let body = response.text().await.map_err(|e| self.map_error(e))?;

        tracing::debug!(
            url = %request.url,
            status = status,
            body_len = body.len(),
            "HTTP response received"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
            encoding,
        })
    }
}
