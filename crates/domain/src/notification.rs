//! 系统通知与按接收者拆分的投递回执

use crate::value_objects::{RecordId, Timestamp, UserId};

/// 系统通知，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotification {
    pub id: i64,
    /// 创建者，0 表示系统发出
    pub created_by: UserId,
    pub title: String,
    pub content: String,
    pub priority: i32,
    pub created_at: Timestamp,
}

/// 单个接收者的投递回执，是系统通道上已读状态的最小单位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotificationReceipt {
    pub id: RecordId,
    pub notification_id: i64,
    pub user_id: UserId,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// 回执与其所属通知的联合行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDelivery {
    pub notification: SystemNotification,
    pub receipt: SystemNotificationReceipt,
}

/// 待写入的系统通知，每次发送恰好产生一条回执。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSystemNotification {
    pub created_by: UserId,
    pub recipient: UserId,
    pub title: String,
    pub content: String,
    pub priority: i32,
}

impl NewSystemNotification {
    /// 负数创建者一律归为系统（0）。
    pub fn new(
        created_by: UserId,
        recipient: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            created_by: UserId(created_by.0.max(0)),
            recipient,
            title: title.into(),
            content: content.into(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_creator_is_clamped_to_system() {
        let n = NewSystemNotification::new(UserId(-5), UserId(42), "t", "c", 1);
        assert_eq!(n.created_by, UserId(0));

        let n = NewSystemNotification::new(UserId(7), UserId(42), "t", "c", 1);
        assert_eq!(n.created_by, UserId(7));
    }
}
