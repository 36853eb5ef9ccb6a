//! 领域模型错误定义
//!
//! 校验失败由 [`DomainError`] 表达，存储层失败由 [`RepositoryError`] 表达。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 字段取值不合法
    #[error("验证失败: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 未知的消息通道
    #[error("unsupported channel: {0}")]
    UnsupportedChannel(String),

    /// 未知的状态过滤条件
    #[error("unsupported status: {0}")]
    UnsupportedStatus(String),

    /// 私信缺少发送者
    #[error("senderId is required for personal channel")]
    MissingSender,

    /// 缺少接收者
    #[error("receiverId is required")]
    MissingReceiver,
}

impl DomainError {
    /// 创建字段校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    /// 唯一约束冲突
    #[error("record already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
