use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

/// 注册与登录共用的哈希端口错误，均映射为 `ApplicationError::Password`。
#[derive(Debug, Error)]
pub enum PasswordHasherError {
    /// 生成摘要失败，或摘要无法作为 [`PasswordHash`] 保存
    #[error("hash error: {0}")]
    Hash(String),
    /// 存储中的摘要格式损坏，无法比对
    #[error("verify error: {0}")]
    Verify(String),
}

impl PasswordHasherError {
    pub fn hash_error(message: impl Into<String>) -> Self {
        Self::Hash(message.into())
    }

    pub fn verify_error(message: impl Into<String>) -> Self {
        Self::Verify(message.into())
    }
}

/// 账户密码哈希端口。
///
/// 登录时密码不匹配返回 `Ok(false)`，由用户服务转成认证失败；
/// 只有摘要本身损坏才返回 [`PasswordHasherError::Verify`]。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;
}
