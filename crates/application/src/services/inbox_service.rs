use std::sync::Arc;

use domain::{
    Channel, DirectMessageFilter, DomainError, Message, MessagePage, NewDirectMessage,
    NewSystemNotification, Ownership, Pagination, ReceiptFilter, RecordId, RepositoryError,
    StatusFilter, UnreadCount, UserId, validate_title,
};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::{ApplicationError, StorageContext},
    repository::MessageRepository,
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub channel: Channel,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub title: String,
    pub content: String,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListMessagesQuery {
    pub channel: Channel,
    pub status: StatusFilter,
    pub pagination: Pagination,
}

pub struct InboxServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 收件箱用例：分发、查询与已读状态。
///
/// 调用方身份由上层认证后以参数传入，这里不再校验令牌。
pub struct InboxService {
    deps: InboxServiceDependencies,
}

fn ensure_identity(user_id: UserId) -> Result<(), ApplicationError> {
    if user_id.is_valid() {
        Ok(())
    } else {
        Err(ApplicationError::MissingIdentity)
    }
}

impl InboxService {
    pub fn new(deps: InboxServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn send(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        if !request.receiver_id.is_valid() {
            return Err(DomainError::MissingReceiver.into());
        }
        validate_title(&request.title)?;
        match request.channel {
            Channel::Personal => self.send_personal(request).await,
            Channel::System => self.send_system(request).await,
        }
    }

    async fn send_personal(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        if !request.sender_id.is_valid() {
            return Err(DomainError::MissingSender.into());
        }

        let new_message = NewDirectMessage::new(
            request.sender_id,
            request.receiver_id,
            request.title,
            request.content,
        );
        let id = self
            .deps
            .message_repository
            .insert_direct(new_message)
            .await
            .context("insert personal message")?;

        let stored = self
            .deps
            .message_repository
            .find_direct(id)
            .await
            .context("load personal message")?
            .ok_or_else(|| {
                ApplicationError::storage("load personal message", RepositoryError::NotFound)
            })?;

        info!(
            message_id = %id,
            sender_id = %request.sender_id,
            receiver_id = %request.receiver_id,
            "私信发送成功"
        );
        Ok(stored.into())
    }

    async fn send_system(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        let notification = NewSystemNotification::new(
            request.sender_id,
            request.receiver_id,
            request.title,
            request.content,
            request.priority,
        );
        let receipt_id = self
            .deps
            .message_repository
            .create_notification_with_receipt(notification.clone())
            .await
            .context("create system notification")?;

        info!(
            receipt_id = %receipt_id,
            created_by = %notification.created_by,
            receiver_id = %notification.recipient,
            "系统通知已投递"
        );

        // 已提交的通知回读不到时，用写入值拼出视图
        match self
            .deps
            .message_repository
            .find_delivery(receipt_id)
            .await
            .context("load system notification")?
        {
            Some(delivery) => Ok(delivery.into()),
            None => {
                warn!(receipt_id = %receipt_id, "回读系统通知失败，使用写入值构造");
                Ok(Message::synthesize_system(
                    receipt_id,
                    &notification,
                    self.deps.clock.now(),
                ))
            }
        }
    }

    pub async fn list(
        &self,
        user_id: UserId,
        query: ListMessagesQuery,
    ) -> Result<MessagePage, ApplicationError> {
        ensure_identity(user_id)?;
        let pagination = query.pagination;
        let repo = &self.deps.message_repository;

        // 计数与分页是两次独立查询，两者之间的写入可能导致 total 与 items 不一致
        let (total, items) = match query.channel {
            Channel::System => {
                let filter = ReceiptFilter::new(user_id, query.status);
                let total = repo
                    .count_receipts(filter)
                    .await
                    .context("count system notifications")?;
                let rows = repo
                    .list_receipts(filter, pagination)
                    .await
                    .context("list system notifications")?;
                (total, rows.into_iter().map(Message::from).collect::<Vec<_>>())
            }
            Channel::Personal => {
                let filter = DirectMessageFilter::new(user_id, query.status);
                let total = repo
                    .count_direct(filter)
                    .await
                    .context("count personal messages")?;
                let rows = repo
                    .list_direct(filter, pagination)
                    .await
                    .context("list personal messages")?;
                (total, rows.into_iter().map(Message::from).collect::<Vec<_>>())
            }
        };

        debug!(
            user_id = %user_id,
            channel = %query.channel,
            total,
            returned = items.len(),
            "消息列表查询"
        );

        Ok(MessagePage {
            items,
            total,
            page: pagination.page,
            size: pagination.size,
        })
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<UnreadCount, ApplicationError> {
        ensure_identity(user_id)?;
        let repo = &self.deps.message_repository;

        let personal = repo
            .count_direct(DirectMessageFilter {
                owner: user_id,
                ownership: Ownership::Received,
                unread_only: true,
            })
            .await
            .context("count unread personal messages")?;
        let system = repo
            .count_receipts(ReceiptFilter {
                recipient: user_id,
                unread_only: true,
            })
            .await
            .context("count unread system notifications")?;

        Ok(UnreadCount::new(personal, system))
    }

    /// 标记已读。记录不存在或不属于调用者都返回
    /// [`ApplicationError::NotFoundOrUnauthorized`]，且不做任何修改。
    ///
    /// 重复标记会刷新已读时间。
    pub async fn mark_read(
        &self,
        user_id: UserId,
        channel: Channel,
        id: RecordId,
    ) -> Result<Message, ApplicationError> {
        ensure_identity(user_id)?;
        let now = self.deps.clock.now();
        let repo = &self.deps.message_repository;

        let message = match channel {
            Channel::System => {
                let affected = repo
                    .mark_receipt_read(id, user_id, now)
                    .await
                    .context("mark system notification read")?;
                if affected == 0 {
                    return Err(ApplicationError::NotFoundOrUnauthorized);
                }
                repo.find_delivery(id)
                    .await
                    .context("load system notification")?
                    .map(Message::from)
            }
            Channel::Personal => {
                let affected = repo
                    .mark_direct_read(id, user_id, now)
                    .await
                    .context("mark personal message read")?;
                if affected == 0 {
                    return Err(ApplicationError::NotFoundOrUnauthorized);
                }
                repo.find_direct(id)
                    .await
                    .context("load personal message")?
                    .map(Message::from)
            }
        };

        info!(user_id = %user_id, channel = %channel, record_id = %id, "消息已标记为已读");
        message.ok_or(ApplicationError::NotFoundOrUnauthorized)
    }
}
