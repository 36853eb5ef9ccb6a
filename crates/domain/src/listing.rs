//! 列表查询的过滤与分页

use serde::Serialize;

use crate::errors::DomainError;
use crate::message::Message;
use crate::value_objects::UserId;

/// 列表状态过滤。
///
/// 原始值可以是逗号分隔的组合，例如 `sent,unread`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFilter {
    /// 按发送者而非接收者筛选（仅对私信有效）
    pub sent: bool,
    pub unread_only: bool,
}

impl StatusFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let mut filter = Self::default();
        let Some(raw) = raw else {
            return Ok(filter);
        };
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "all" => {}
                "sent" => filter.sent = true,
                "unread" => filter.unread_only = true,
                other => return Err(DomainError::UnsupportedStatus(other.to_owned())),
            }
        }
        Ok(filter)
    }
}

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Pagination {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_SIZE: i64 = 20;

    /// 非正数回落到默认值，其余原样作为 limit。
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PAGE);
        let size = size.filter(|s| *s > 0).unwrap_or(Self::DEFAULT_SIZE);
        Self { page, size }
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// 私信按谁的视角筛选
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Received,
    Sent,
}

/// 私信列表过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectMessageFilter {
    pub owner: UserId,
    pub ownership: Ownership,
    pub unread_only: bool,
}

impl DirectMessageFilter {
    pub fn new(owner: UserId, status: StatusFilter) -> Self {
        Self {
            owner,
            ownership: if status.sent {
                Ownership::Sent
            } else {
                Ownership::Received
            },
            unread_only: status.unread_only,
        }
    }
}

/// 系统通知回执列表过滤条件，`sent` 在此通道上无意义。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptFilter {
    pub recipient: UserId,
    pub unread_only: bool,
}

impl ReceiptFilter {
    pub fn new(recipient: UserId, status: StatusFilter) -> Self {
        Self {
            recipient,
            unread_only: status.unread_only,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

/// 未读计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UnreadCount {
    pub personal: i64,
    pub system: i64,
    pub total: i64,
}

impl UnreadCount {
    pub fn new(personal: i64, system: i64) -> Self {
        Self {
            personal,
            system,
            total: personal + system,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(StatusFilter::parse(None).unwrap(), StatusFilter::default());
        assert_eq!(StatusFilter::parse(Some("all")).unwrap(), StatusFilter::default());
        assert_eq!(StatusFilter::parse(Some("")).unwrap(), StatusFilter::default());

        let f = StatusFilter::parse(Some("sent, unread")).unwrap();
        assert!(f.sent && f.unread_only);

        assert_eq!(
            StatusFilter::parse(Some("starred")),
            Err(DomainError::UnsupportedStatus("starred".into()))
        );
    }

    #[test]
    fn pagination_defaults_and_passthrough() {
        let p = Pagination::new(Some(0), Some(-3));
        assert_eq!((p.page, p.size), (1, 20));
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), Some(10));
        assert_eq!(p.offset(), 20);
        assert_eq!(p.limit(), 10);

        let p = Pagination::new(Some(1), Some(150));
        assert_eq!((p.size, p.limit()), (150, 150));
    }

    #[test]
    fn sent_switches_direct_message_ownership() {
        let status = StatusFilter::parse(Some("sent")).unwrap();
        let f = DirectMessageFilter::new(UserId(7), status);
        assert_eq!(f.ownership, Ownership::Sent);

        let f = ReceiptFilter::new(UserId(7), status);
        assert!(!f.unread_only);
    }

    #[test]
    fn unread_total_is_sum() {
        let c = UnreadCount::new(1, 2);
        assert_eq!(c.total, 3);
    }
}
