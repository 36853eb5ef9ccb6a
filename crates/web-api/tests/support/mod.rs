//! 集成测试共用的内存仓储与请求工具

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use application::{
    repository::{MessageRepository, UserRepository},
    services::{InboxService, InboxServiceDependencies, UserService, UserServiceDependencies},
    PasswordHasher, PasswordHasherError, SystemClock,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use domain::{
    DirectMessage, DirectMessageFilter, NewDirectMessage, NewSystemNotification, NewUser,
    Ownership, Pagination, PasswordHash, ReceiptFilter, RecordId, RepositoryError,
    SystemDelivery, SystemNotification, SystemNotificationReceipt, Timestamp, User, UserId,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use web_api::{app, AppState, JwtConfig, JwtService};

pub const TEST_SECRET: &str = "integration-test-secret-with-at-least-32-chars";

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut guard = self.users.write().await;
        if guard.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict);
        }
        let stored = User {
            id: UserId(guard.len() as i64 + 1),
            username: user.username,
            password: user.password,
            created_at: Utc::now(),
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.read().await;
        Ok(guard.iter().find(|u| u.username.as_str() == username).cloned())
    }
}

#[derive(Default)]
struct MessageStore {
    direct: Vec<DirectMessage>,
    notifications: Vec<SystemNotification>,
    receipts: Vec<SystemNotificationReceipt>,
}

impl MessageStore {
    fn delivery(&self, receipt: &SystemNotificationReceipt) -> Option<SystemDelivery> {
        self.notifications
            .iter()
            .find(|n| n.id == receipt.notification_id)
            .map(|n| SystemDelivery {
                notification: n.clone(),
                receipt: receipt.clone(),
            })
    }

    fn matching_direct(&self, filter: &DirectMessageFilter) -> Vec<DirectMessage> {
        let mut rows: Vec<_> = self
            .direct
            .iter()
            .filter(|m| match filter.ownership {
                Ownership::Received => m.receiver_id == filter.owner,
                Ownership::Sent => m.sender_id == filter.owner,
            })
            .filter(|m| !filter.unread_only || !m.is_read)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id.0).cmp(&(a.created_at, a.id.0)));
        rows
    }

    fn matching_receipts(&self, filter: &ReceiptFilter) -> Vec<SystemNotificationReceipt> {
        let mut rows: Vec<_> = self
            .receipts
            .iter()
            .filter(|r| r.user_id == filter.recipient)
            .filter(|r| !filter.unread_only || !r.is_read)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id.0).cmp(&(a.created_at, a.id.0)));
        rows
    }
}

fn page_of<T>(rows: Vec<T>, page: Pagination) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

/// 内存消息仓储。`fail_system_writes` 打开后系统通知写入在“提交”前失败且不留痕迹。
#[derive(Default)]
pub struct InMemoryMessageRepository {
    store: RwLock<MessageStore>,
    fail_system_writes: AtomicBool,
}

impl InMemoryMessageRepository {
    pub fn fail_system_writes(&self, fail: bool) {
        self.fail_system_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn notification_count(&self) -> usize {
        self.store.read().await.notifications.len()
    }

    pub async fn receipt_count(&self) -> usize {
        self.store.read().await.receipts.len()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert_direct(&self, message: NewDirectMessage) -> Result<RecordId, RepositoryError> {
        let mut guard = self.store.write().await;
        let id = RecordId(guard.direct.len() as i64 + 1);
        guard.direct.push(DirectMessage {
            id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            title: message.title,
            content: message.content,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_direct(&self, id: RecordId) -> Result<Option<DirectMessage>, RepositoryError> {
        let guard = self.store.read().await;
        Ok(guard.direct.iter().find(|m| m.id == id).cloned())
    }

    async fn create_notification_with_receipt(
        &self,
        notification: NewSystemNotification,
    ) -> Result<RecordId, RepositoryError> {
        // 整个写入持有同一把写锁，失败时不做任何修改
        let mut guard = self.store.write().await;
        if self.fail_system_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("simulated receipt insert failure"));
        }

        let now = Utc::now();
        let notification_id = guard.notifications.len() as i64 + 1;
        guard.notifications.push(SystemNotification {
            id: notification_id,
            created_by: notification.created_by,
            title: notification.title,
            content: notification.content,
            priority: notification.priority,
            created_at: now,
        });

        let receipt_id = RecordId(guard.receipts.len() as i64 + 1);
        guard.receipts.push(SystemNotificationReceipt {
            id: receipt_id,
            notification_id,
            user_id: notification.recipient,
            is_read: false,
            read_at: None,
            created_at: now,
        });
        Ok(receipt_id)
    }

    async fn find_delivery(
        &self,
        receipt_id: RecordId,
    ) -> Result<Option<SystemDelivery>, RepositoryError> {
        let guard = self.store.read().await;
        Ok(guard
            .receipts
            .iter()
            .find(|r| r.id == receipt_id)
            .and_then(|r| guard.delivery(r)))
    }

    async fn count_direct(&self, filter: DirectMessageFilter) -> Result<i64, RepositoryError> {
        let guard = self.store.read().await;
        Ok(guard.matching_direct(&filter).len() as i64)
    }

    async fn list_direct(
        &self,
        filter: DirectMessageFilter,
        page: Pagination,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let guard = self.store.read().await;
        Ok(page_of(guard.matching_direct(&filter), page))
    }

    async fn count_receipts(&self, filter: ReceiptFilter) -> Result<i64, RepositoryError> {
        let guard = self.store.read().await;
        Ok(guard.matching_receipts(&filter).len() as i64)
    }

    async fn list_receipts(
        &self,
        filter: ReceiptFilter,
        page: Pagination,
    ) -> Result<Vec<SystemDelivery>, RepositoryError> {
        let guard = self.store.read().await;
        Ok(page_of(guard.matching_receipts(&filter), page)
            .iter()
            .filter_map(|r| guard.delivery(r))
            .collect())
    }

    async fn mark_direct_read(
        &self,
        id: RecordId,
        receiver: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.store.write().await;
        match guard
            .direct
            .iter_mut()
            .find(|m| m.id == id && m.receiver_id == receiver)
        {
            Some(message) => {
                message.is_read = true;
                message.read_at = Some(read_at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn mark_receipt_read(
        &self,
        receipt_id: RecordId,
        recipient: UserId,
        read_at: Timestamp,
    ) -> Result<u64, RepositoryError> {
        let mut guard = self.store.write().await;
        match guard
            .receipts
            .iter_mut()
            .find(|r| r.id == receipt_id && r.user_id == recipient)
        {
            Some(receipt) => {
                receipt.is_read = true;
                receipt.read_at = Some(read_at);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(plaintext.to_owned())
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == plaintext)
    }
}

pub struct TestApp {
    pub router: Router,
    pub messages: Arc<InMemoryMessageRepository>,
    pub jwt: Arc<JwtService>,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let messages = Arc::new(InMemoryMessageRepository::default());
    let jwt = Arc::new(JwtService::new(&JwtConfig {
        secret: TEST_SECRET.to_string(),
        expiration_secs: 3600,
    }));

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: users,
        password_hasher: Arc::new(PlainPasswordHasher),
        token_service: jwt.clone(),
    }));
    let inbox_service = Arc::new(InboxService::new(InboxServiceDependencies {
        message_repository: messages.clone(),
        clock: Arc::new(SystemClock),
    }));

    let state = AppState::new(user_service, inbox_service, jwt.clone());
    TestApp {
        router: app(state, Duration::from_secs(30)),
        messages,
        jwt,
    }
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// 注册用户，返回 (token, user id)
pub async fn register(app: &Router, username: &str, password: &str) -> (String, i64) {
    let (status, body) = send_request(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}
