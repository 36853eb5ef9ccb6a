//! 收件箱系统核心领域模型
//!
//! 包含用户、私信、系统通知及其回执，以及统一消息视图和列表查询参数。

pub mod direct_message;
pub mod errors;
pub mod listing;
pub mod message;
pub mod notification;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use direct_message::*;
pub use errors::*;
pub use listing::*;
pub use message::*;
pub use notification::*;
pub use user::*;
pub use value_objects::*;
