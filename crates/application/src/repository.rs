use async_trait::async_trait;
use domain::{
    DirectMessage, DirectMessageFilter, NewDirectMessage, NewSystemNotification, NewUser,
    Pagination, ReceiptFilter, RecordId, RepositoryError, SystemDelivery, Timestamp, User, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 用户名重复时返回 [`RepositoryError::Conflict`]
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 写入私信，返回新记录 id
    async fn insert_direct(&self, message: NewDirectMessage) -> Result<RecordId, RepositoryError>;

    async fn find_direct(&self, id: RecordId) -> Result<Option<DirectMessage>, RepositoryError>;

    /// 在同一事务中写入通知和它唯一的回执，返回回执 id。
    ///
    /// 提交前的任何失败都会回滚，不会留下没有回执的通知。
    async fn create_notification_with_receipt(
        &self,
        notification: NewSystemNotification,
    ) -> Result<RecordId, RepositoryError>;

    // 按回执 id 读取回执及其通知
    async fn find_delivery(
        &self,
        receipt_id: RecordId,
    ) -> Result<Option<SystemDelivery>, RepositoryError>;

    async fn count_direct(&self, filter: DirectMessageFilter) -> Result<i64, RepositoryError>;

    /// 按创建时间倒序分页
    async fn list_direct(
        &self,
        filter: DirectMessageFilter,
        page: Pagination,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    async fn count_receipts(&self, filter: ReceiptFilter) -> Result<i64, RepositoryError>;

    async fn list_receipts(
        &self,
        filter: ReceiptFilter,
        page: Pagination,
    ) -> Result<Vec<SystemDelivery>, RepositoryError>;

    /// 仅当接收者匹配时标记已读，返回受影响行数
    async fn mark_direct_read(
        &self,
        id: RecordId,
        receiver: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError>;

    /// 仅当回执属于该用户时标记已读，返回受影响行数
    async fn mark_receipt_read(
        &self,
        receipt_id: RecordId,
        recipient: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError>;
}
