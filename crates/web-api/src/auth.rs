//! JWT 认证和授权模块
//!
//! 提供 JWT token 生成、验证，以及从请求头解析调用者身份的提取器。

use application::{TokenError, TokenService};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use config::JwtConfig;
use domain::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::ApiError, state::AppState};

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    expiration_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            expiration_secs: config.expiration_secs,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

impl TokenService for JwtService {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user_id.into(),
            exp: chrono::Utc::now().timestamp() + self.expiration_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Issuance(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)?;

        let user_id = UserId::from(claims.user_id);
        if !user_id.is_valid() {
            return Err(TokenError::Invalid);
        }
        Ok(user_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthGateError {
    #[error("missing or malformed authorization header")]
    MissingCredential,
    #[error("invalid or expired token")]
    InvalidCredential,
}

/// 从 `Authorization` 头中取出 Bearer 令牌。
///
/// 按第一个空格切分，scheme 不区分大小写，令牌去除首尾空白后不能为空。
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthGateError> {
    let (scheme, token) = header
        .and_then(|value| value.split_once(' '))
        .ok_or(AuthGateError::MissingCredential)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthGateError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthGateError::MissingCredential);
    }
    Ok(token)
}

/// 已认证的调用者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = extract_bearer(header)?;

        let user_id = state
            .token_service
            .verify(token)
            .map_err(|_| AuthGateError::InvalidCredential)?;
        Ok(AuthUser(user_id))
    }
}
