use domain::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token issuance failed: {0}")]
    Issuance(String),
    #[error("invalid or expired token")]
    Invalid,
}

/// 访问令牌的签发与校验。
///
/// 校验成功时返回的用户 id 一定为正数。
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}
