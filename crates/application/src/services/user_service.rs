use std::sync::Arc;

use domain::{validate_new_password, DomainError, NewUser, RepositoryError, User, Username};
use tracing::{info, warn};

use crate::{
    error::{ApplicationError, StorageContext},
    password::PasswordHasher,
    repository::UserRepository,
    token::TokenService,
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

/// 注册或登录成功后返回的会话
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<dyn TokenService>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(
        &self,
        request: RegisterUserRequest,
    ) -> Result<AuthSession, ApplicationError> {
        let username = Username::parse(request.username)?;
        validate_new_password(&request.password)?;

        let password = self.deps.password_hasher.hash(&request.password).await?;

        let user = self
            .deps
            .user_repository
            .create(NewUser { username, password })
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    ApplicationError::Conflict("username already taken".to_string())
                }
                other => ApplicationError::storage("create user", other),
            })?;

        let token = self.deps.token_service.issue(user.id)?;
        info!(user_id = %user.id, username = %user.username, "用户注册成功");
        Ok(AuthSession { token, user })
    }

    /// 登录不校验密码长度，任何错误密码都按认证失败处理。
    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<AuthSession, ApplicationError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(DomainError::invalid_argument("username", "用户名不能为空").into());
        }

        let user = self
            .deps
            .user_repository
            .find_by_username(username)
            .await
            .context("find user")?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            warn!(user_id = %user.id, "密码校验失败");
            return Err(ApplicationError::Authentication);
        }

        let token = self.deps.token_service.issue(user.id)?;
        Ok(AuthSession { token, user })
    }
}
