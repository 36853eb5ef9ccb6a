use serde::Serialize;

use crate::value_objects::{PasswordHash, Timestamp, UserId, Username};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub created_at: Timestamp,
}

/// 注册时写入的新用户，id 由存储层分配。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub password: PasswordHash,
}
