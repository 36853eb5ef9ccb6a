use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use application::services::{
    AuthSession, AuthenticateUserRequest, ListMessagesQuery, RegisterUserRequest,
    SendMessageRequest,
};
use domain::{Channel, Message, MessagePage, Pagination, RecordId, StatusFilter, UnreadCount, UserId};

use crate::{auth::AuthUser, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct CredentialsPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct UserView {
    id: i64,
    username: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserView,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: UserView {
                id: session.user.id.into(),
                username: session.user.username.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SendMessagePayload {
    channel: Option<String>,
    sender_id: Option<i64>,
    receiver_id: i64,
    title: String,
    content: String,
    priority: i32,
}

#[derive(Debug, Default, Deserialize)]
struct ListMessagesParams {
    channel: Option<String>,
    status: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarkReadPayload {
    channel: Option<String>,
}

/// 业务路由，不含中间件
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

/// 带请求追踪与超时的完整应用。超时后请求 future 被丢弃，未提交的事务随之回滚。
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    router(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/messages", post(send_message).get(list_messages))
        .route("/messages/unread/count", get(unread_count))
        .route("/messages/{id}/read", post(mark_message_read))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let session = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok(Json(session.into()))
}

async fn send_message(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<Message>, ApiError> {
    let channel = Channel::parse(payload.channel.as_deref())?;

    // 私信发送者总是调用者；系统通知未指定创建者时记为调用者
    let sender_id = match (channel, payload.sender_id) {
        (Channel::Personal, _) | (Channel::System, None | Some(0)) => caller,
        (Channel::System, Some(id)) => UserId::from(id),
    };

    let message = state
        .inbox_service
        .send(SendMessageRequest {
            channel,
            sender_id,
            receiver_id: UserId::from(payload.receiver_id),
            title: payload.title,
            content: payload.content,
            priority: payload.priority,
        })
        .await?;

    Ok(Json(message))
}

async fn list_messages(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Json<MessagePage>, ApiError> {
    let query = ListMessagesQuery {
        channel: Channel::parse(params.channel.as_deref())?,
        status: StatusFilter::parse(params.status.as_deref())?,
        pagination: Pagination::new(params.page, params.size),
    };

    let page = state.inbox_service.list(caller, query).await?;
    Ok(Json(page))
}

async fn mark_message_read(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Message>, ApiError> {
    // 请求体可省略，省略时按 personal 处理
    let payload: MarkReadPayload = if body.iter().all(u8::is_ascii_whitespace) {
        MarkReadPayload::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::bad_request(format!("invalid request body: {err}")))?
    };
    let channel = Channel::parse(payload.channel.as_deref())?;

    let message = state
        .inbox_service
        .mark_read(caller, channel, RecordId::from(id))
        .await?;
    Ok(Json(message))
}

async fn unread_count(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCount>, ApiError> {
    let count = state.inbox_service.unread_count(caller).await?;
    Ok(Json(count))
}
