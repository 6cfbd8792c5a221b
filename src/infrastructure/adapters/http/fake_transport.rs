//! Fake Transport - 用于测试的 HTTP 调用
//!
//! 按顺序返回预先设定的响应或错误，并记录收到的请求

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{HttpRequest, HttpResponse, HttpTransportPort, TransportError};

/// Fake Transport
///
/// 脚本用完后返回网络错误
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个响应
    pub fn respond(self, response: HttpResponse) -> Self {
        self.push(Ok(response))
    }

    /// 追加一个网络错误
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    /// 每次调用前等待，用于模拟超时
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, item: Result<HttpResponse, TransportError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
        self
    }

    /// 已收到的请求数
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl HttpTransportPort for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        tracing::debug!(url = %request.url, scripted = next.is_some(), "FakeTransport: returning scripted result");

        next.unwrap_or_else(|| {
            Err(TransportError::Network(format!(
                "no scripted response for {}",
                request.url
            )))
        })
    }
}
