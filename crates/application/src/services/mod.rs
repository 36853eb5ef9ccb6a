mod inbox_service;
mod user_service;


pub use inbox_service::{
    InboxService, InboxServiceDependencies, ListMessagesQuery, SendMessageRequest,
};
pub use user_service::{
    AuthSession, AuthenticateUserRequest, RegisterUserRequest, UserService,
    UserServiceDependencies,
};
