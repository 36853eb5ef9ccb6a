use crate::value_objects::{RecordId, Timestamp, UserId};

/// 点对点私信。
///
/// 除已读标记与已读时间外不可变；已读状态只能由接收者修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessage {
    pub id: RecordId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub title: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// 待写入的私信。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDirectMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub title: Option<String>,
    pub content: String,
}

impl NewDirectMessage {
    /// 空标题按缺省处理，落库为 NULL。
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            sender_id,
            receiver_id,
            title: (!title.is_empty()).then_some(title),
            content: content.into(),
        }
    }
}
