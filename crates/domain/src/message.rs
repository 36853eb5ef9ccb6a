//! 统一消息视图
//!
//! 私信与系统通知在存储上形状不同，对外统一呈现为 [`Message`]。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::direct_message::DirectMessage;
use crate::errors::DomainError;
use crate::notification::{NewSystemNotification, SystemDelivery};
use crate::value_objects::{format_timestamp, RecordId, Timestamp, UserId};

/// 消息通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Personal,
    System,
}

impl Channel {
    /// 解析请求中的通道参数，缺省或空串视为 personal。
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::Personal),
            Some(value) => value.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::System => "system",
        }
    }
}

impl FromStr for Channel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "system" => Ok(Self::System),
            other => Err(DomainError::UnsupportedChannel(other.to_owned())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对外返回的统一消息。
///
/// `id` 的含义取决于 `channel`：personal 为私信 id，system 为回执 id。
/// 缺省的标题与已读时间以空串表示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: RecordId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub title: String,
    pub content: String,
    pub is_read: bool,
    pub read_at: String,
    pub created_at: String,
    pub channel: Channel,
    pub priority: i32,
}

impl Message {
    /// 写入已提交但回读失败时，用写入值拼出系统通知视图。
    pub fn synthesize_system(
        receipt_id: RecordId,
        notification: &NewSystemNotification,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: receipt_id,
            sender_id: notification.created_by,
            receiver_id: notification.recipient,
            title: notification.title.clone(),
            content: notification.content.clone(),
            is_read: false,
            read_at: String::new(),
            created_at: format_timestamp(&created_at),
            channel: Channel::System,
            priority: notification.priority,
        }
    }
}

fn format_optional(ts: Option<Timestamp>) -> String {
    ts.as_ref().map(format_timestamp).unwrap_or_default()
}

impl From<DirectMessage> for Message {
    fn from(msg: DirectMessage) -> Self {
        Self {
            id: msg.id,
            sender_id: msg.sender_id,
            receiver_id: msg.receiver_id,
            title: msg.title.unwrap_or_default(),
            content: msg.content,
            is_read: msg.is_read,
            read_at: format_optional(msg.read_at),
            created_at: format_timestamp(&msg.created_at),
            channel: Channel::Personal,
            priority: 0,
        }
    }
}

impl From<SystemDelivery> for Message {
    fn from(delivery: SystemDelivery) -> Self {
        let SystemDelivery {
            notification,
            receipt,
        } = delivery;
        Self {
            id: receipt.id,
            sender_id: notification.created_by,
            receiver_id: receipt.user_id,
            title: notification.title,
            content: notification.content,
            is_read: receipt.is_read,
            read_at: format_optional(receipt.read_at),
            // 回执的创建时间即投递时间
            created_at: format_timestamp(&receipt.created_at),
            channel: Channel::System,
            priority: notification.priority,
        }
    }
}
