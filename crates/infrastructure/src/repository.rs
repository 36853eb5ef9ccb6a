use std::sync::Arc;

use application::repository::{MessageRepository, UserRepository};
use async_trait::async_trait;
use domain::{
    DirectMessage, DirectMessageFilter, NewDirectMessage, NewSystemNotification, NewUser,
    Ownership, Pagination, PasswordHash, ReceiptFilter, RecordId, RepositoryError,
    SystemDelivery, SystemNotification, SystemNotificationReceipt, Timestamp, User, UserId,
    Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::debug;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepositoryError::Conflict,
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
    created_at: Timestamp,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username = Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            username,
            password,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DirectMessageRecord {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    title: Option<String>,
    content: String,
    is_read: bool,
    read_at: Option<Timestamp>,
    created_at: Timestamp,
}

impl From<DirectMessageRecord> for DirectMessage {
    fn from(value: DirectMessageRecord) -> Self {
        DirectMessage {
            id: RecordId::from(value.id),
            sender_id: UserId::from(value.sender_id),
            receiver_id: UserId::from(value.receiver_id),
            title: value.title,
            content: value.content,
            is_read: value.is_read,
            read_at: value.read_at,
            created_at: value.created_at,
        }
    }
}

/// 回执与通知的联合行
#[derive(Debug, FromRow)]
struct DeliveryRecord {
    receipt_id: i64,
    notification_id: i64,
    user_id: i64,
    is_read: bool,
    read_at: Option<Timestamp>,
    receipt_created_at: Timestamp,
    created_by: i64,
    title: String,
    content: String,
    priority: i32,
    notification_created_at: Timestamp,
}

impl From<DeliveryRecord> for SystemDelivery {
    fn from(value: DeliveryRecord) -> Self {
        SystemDelivery {
            notification: SystemNotification {
                id: value.notification_id,
                created_by: UserId::from(value.created_by),
                title: value.title,
                content: value.content,
                priority: value.priority,
                created_at: value.notification_created_at,
            },
            receipt: SystemNotificationReceipt {
                id: RecordId::from(value.receipt_id),
                notification_id: value.notification_id,
                user_id: UserId::from(value.user_id),
                is_read: value.is_read,
                read_at: value.read_at,
                created_at: value.receipt_created_at,
            },
        }
    }
}

const DIRECT_COLUMNS: &str =
    "id, sender_id, receiver_id, title, content, is_read, read_at, created_at";

const DELIVERY_SELECT: &str = r#"
    SELECT r.id AS receipt_id, r.notification_id, r.user_id, r.is_read, r.read_at,
           r.created_at AS receipt_created_at,
           n.created_by, n.title, n.content, n.priority,
           n.created_at AS notification_created_at
    FROM system_notification_receipts r
    JOIN system_notifications n ON n.id = r.notification_id
"#;

// 过滤条件只来自封闭枚举，拼接的都是静态片段
fn direct_predicate(filter: &DirectMessageFilter) -> &'static str {
    match (filter.ownership, filter.unread_only) {
        (Ownership::Received, false) => "receiver_id = $1",
        (Ownership::Received, true) => "receiver_id = $1 AND is_read = FALSE",
        (Ownership::Sent, false) => "sender_id = $1",
        (Ownership::Sent, true) => "sender_id = $1 AND is_read = FALSE",
    }
}

fn receipt_predicate(filter: &ReceiptFilter) -> &'static str {
    if filter.unread_only {
        "r.user_id = $1 AND r.is_read = FALSE"
    } else {
        "r.user_id = $1"
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(user.username.as_str())
        .bind(user.password.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, password_hash, created_at FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert_direct(&self, message: NewDirectMessage) -> Result<RecordId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO direct_messages (sender_id, receiver_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(i64::from(message.sender_id))
        .bind(i64::from(message.receiver_id))
        .bind(message.title.as_deref())
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(RecordId::from(id))
    }

    async fn find_direct(&self, id: RecordId) -> Result<Option<DirectMessage>, RepositoryError> {
        let sql = format!("SELECT {DIRECT_COLUMNS} FROM direct_messages WHERE id = $1");
        let record = sqlx::query_as::<_, DirectMessageRecord>(&sql)
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(record.map(DirectMessage::from))
    }

    async fn create_notification_with_receipt(
        &self,
        notification: NewSystemNotification,
    ) -> Result<RecordId, RepositoryError> {
        // 未提交的事务在 drop 时回滚
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let notification_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO system_notifications (title, content, priority, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.content)
        .bind(notification.priority)
        .bind(i64::from(notification.created_by))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let receipt_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO system_notification_receipts (notification_id, user_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(notification_id)
        .bind(i64::from(notification.recipient))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        debug!(notification_id, receipt_id, "系统通知与回执已写入");
        Ok(RecordId::from(receipt_id))
    }

    async fn find_delivery(
        &self,
        receipt_id: RecordId,
    ) -> Result<Option<SystemDelivery>, RepositoryError> {
        let sql = format!("{DELIVERY_SELECT} WHERE r.id = $1");
        let record = sqlx::query_as::<_, DeliveryRecord>(&sql)
            .bind(i64::from(receipt_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(record.map(SystemDelivery::from))
    }

    async fn count_direct(&self, filter: DirectMessageFilter) -> Result<i64, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM direct_messages WHERE {}",
            direct_predicate(&filter)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(i64::from(filter.owner))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn list_direct(
        &self,
        filter: DirectMessageFilter,
        page: Pagination,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let sql = format!(
            "SELECT {DIRECT_COLUMNS} FROM direct_messages WHERE {} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            direct_predicate(&filter)
        );
        let records = sqlx::query_as::<_, DirectMessageRecord>(&sql)
            .bind(i64::from(filter.owner))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(DirectMessage::from).collect())
    }

    async fn count_receipts(&self, filter: ReceiptFilter) -> Result<i64, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM system_notification_receipts r WHERE {}",
            receipt_predicate(&filter)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(i64::from(filter.recipient))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn list_receipts(
        &self,
        filter: ReceiptFilter,
        page: Pagination,
    ) -> Result<Vec<SystemDelivery>, RepositoryError> {
        let sql = format!(
            "{DELIVERY_SELECT} WHERE {} ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3",
            receipt_predicate(&filter)
        );
        let records = sqlx::query_as::<_, DeliveryRecord>(&sql)
            .bind(i64::from(filter.recipient))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(SystemDelivery::from).collect())
    }

    async fn mark_direct_read(
        &self,
        id: RecordId,
        receiver: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE direct_messages
            SET is_read = TRUE, read_at = $3
            WHERE id = $1 AND receiver_id = $2
            "#,
        )
        .bind(i64::from(id))
        .bind(i64::from(receiver))
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn mark_receipt_read(
        &self,
        receipt_id: RecordId,
        recipient: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE system_notification_receipts
            SET is_read = TRUE, read_at = $3
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(i64::from(receipt_id))
        .bind(i64::from(recipient))
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_predicates_follow_filter() {
        let mut filter = DirectMessageFilter {
            owner: UserId(1),
            ownership: Ownership::Received,
            unread_only: false,
        };
        assert_eq!(direct_predicate(&filter), "receiver_id = $1");

        filter.ownership = Ownership::Sent;
        filter.unread_only = true;
        assert_eq!(direct_predicate(&filter), "sender_id = $1 AND is_read = FALSE");
    }

    #[test]
    fn receipt_predicate_narrows_unread() {
        let filter = ReceiptFilter {
            recipient: UserId(1),
            unread_only: true,
        };
        assert!(receipt_predicate(&filter).ends_with("r.is_read = FALSE"));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_err(sqlx::Error::RowNotFound), RepositoryError::NotFound);
        assert!(matches!(
            map_sqlx_err(sqlx::Error::PoolTimedOut),
            RepositoryError::Storage { .. }
        ));
    }
}
