//! 应用层错误定义
//!
//! 工具调用边界上只暴露一条描述性的错误文本

use thiserror::Error;

use crate::domain::SearchError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 检索错误（文本直接面向用户）
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}
