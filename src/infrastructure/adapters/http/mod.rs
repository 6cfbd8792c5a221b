//! HTTP Adapter - 出站 HTTP 调用实现

mod fake_transport;
mod reqwest_transport;

pub use fake_transport::FakeTransport;
pub use reqwest_transport::*;
