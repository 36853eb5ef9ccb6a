use application::{ApplicationError, TokenError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;

use crate::auth::AuthGateError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let code = match &error {
            DomainError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            DomainError::UnsupportedChannel(_) => "UNSUPPORTED_CHANNEL",
            DomainError::UnsupportedStatus(_) => "UNSUPPORTED_STATUS",
            DomainError::MissingSender => "MISSING_SENDER",
            DomainError::MissingReceiver => "MISSING_RECEIVER",
        };
        let message = match error {
            DomainError::InvalidArgument { field, reason } => format!("{field}: {reason}"),
            other => other.to_string(),
        };
        ApiError::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl From<AuthGateError> for ApiError {
    fn from(error: AuthGateError) -> Self {
        ApiError::unauthorized(error.to_string())
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(err) => err.into(),
            AppErr::Authentication => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                "invalid username or password",
            ),
            AppErr::MissingIdentity => ApiError::unauthorized("missing caller identity"),
            AppErr::Token(TokenError::Invalid) => ApiError::unauthorized("invalid or expired token"),
            AppErr::Conflict(message) => ApiError::new(StatusCode::CONFLICT, "CONFLICT", message),
            AppErr::NotFoundOrUnauthorized => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "message not found or unauthorized",
            ),
            // 驱动与底层错误只记录日志，不返回给客户端
            AppErr::Storage { .. } => {
                tracing::error!(error = %error, "存储层错误");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "internal storage error",
                )
            }
            AppErr::Password(ref err) => {
                tracing::error!(error = %err, "密码哈希失败");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PASSWORD_ERROR",
                    "failed to process credentials",
                )
            }
            AppErr::Token(ref err) => {
                tracing::error!(error = %err, "令牌签发失败");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKEN_ERROR",
                    "failed to issue token",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::RepositoryError;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApplicationError::from(DomainError::MissingSender), StatusCode::BAD_REQUEST),
            (ApplicationError::Authentication, StatusCode::UNAUTHORIZED),
            (ApplicationError::MissingIdentity, StatusCode::UNAUTHORIZED),
            (ApplicationError::Conflict("username already taken".into()), StatusCode::CONFLICT),
            (ApplicationError::NotFoundOrUnauthorized, StatusCode::NOT_FOUND),
            (
                ApplicationError::storage("list", RepositoryError::storage("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = ApiError::from(ApplicationError::storage(
            "insert personal message",
            RepositoryError::storage("duplicate key value violates constraint \"pk\""),
        ));
        assert_eq!(err.body.message, "internal storage error");
    }
}
