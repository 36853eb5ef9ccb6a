//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、令牌签发）的抽象。

pub mod clock;
pub mod error;
pub mod password;
pub mod repository;
pub mod services;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApplicationError, StorageContext};
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{MessageRepository, UserRepository};
pub use services::{
    AuthSession, AuthenticateUserRequest, InboxService, InboxServiceDependencies,
    ListMessagesQuery, RegisterUserRequest, SendMessageRequest, UserService,
    UserServiceDependencies,
};
pub use token::{TokenError, TokenService};
