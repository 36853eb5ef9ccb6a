use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::password::PasswordHasherError;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    /// 登录失败，不区分用户不存在与密码错误
    #[error("invalid username or password")]
    Authentication,
    #[error("missing caller identity")]
    MissingIdentity,
    #[error("conflict: {0}")]
    Conflict(String),
    /// 记录不存在与无权操作合并为同一种错误
    #[error("message not found or unauthorized")]
    NotFoundOrUnauthorized,
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl ApplicationError {
    pub fn storage(context: &'static str, source: RepositoryError) -> Self {
        ApplicationError::Storage { context, source }
    }

    /// 是否属于调用方输入错误
    pub fn is_validation(&self) -> bool {
        matches!(self, ApplicationError::Domain(_))
    }
}

/// 为仓储结果附加调用路径上下文
pub trait StorageContext<T> {
    fn context(self, context: &'static str) -> Result<T, ApplicationError>;
}

impl<T> StorageContext<T> for Result<T, RepositoryError> {
    fn context(self, context: &'static str) -> Result<T, ApplicationError> {
        self.map_err(|source| ApplicationError::storage(context, source))
    }
}
