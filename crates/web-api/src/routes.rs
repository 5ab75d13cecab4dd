use std::convert::Infallible;

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::{EditMessageRequest, SendMessageRequest};
use domain::{parse_limit, Message, Participant, ParticipantPayload};

use crate::{error::ApiError, state::AppState};

/// 携带操作者名称的请求头
pub const USER_HEADER: &str = "user";

/// 从 `User` 请求头读取的操作者名称；缺失时为空字符串，由后续校验或所有权检查拒绝
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingParticipant(pub String);

impl<S> FromRequestParts<S> for ActingParticipant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        Ok(Self(name))
    }
}

/// JSON 请求体提取器，解析失败时返回统一的错误响应
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    to: String,
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ListMessagesQuery {
    limit: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(join).get(list_participants))
        .route("/status", post(heartbeat))
        .route("/messages", post(send_message).get(list_messages))
        .route("/messages/{id}", put(edit_message).delete(delete_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn join(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ParticipantPayload>,
) -> Result<StatusCode, ApiError> {
    state.presence_service.join(payload).await?;
    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let participants = state.presence_service.list().await?;
    Ok(Json(participants))
}

async fn heartbeat(
    State(state): State<AppState>,
    ActingParticipant(user): ActingParticipant,
) -> Result<StatusCode, ApiError> {
    state.presence_service.heartbeat(&user).await?;
    Ok(StatusCode::OK)
}

async fn send_message(
    State(state): State<AppState>,
    ActingParticipant(user): ActingParticipant,
    ApiJson(body): ApiJson<MessageBody>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .message_service
        .send(SendMessageRequest {
            from: user,
            to: body.to,
            text: body.text,
            kind: body.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<AppState>,
    ActingParticipant(user): ActingParticipant,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = parse_limit(query.limit.as_deref());
    let messages = state.message_service.list(&user, limit).await?;
    Ok(Json(messages))
}

async fn edit_message(
    State(state): State<AppState>,
    ActingParticipant(user): ActingParticipant,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MessageBody>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .message_service
        .edit(EditMessageRequest {
            id,
            requester: user,
            to: body.to,
            text: body.text,
            kind: body.kind,
        })
        .await?;

    Ok(Json(message))
}

async fn delete_message(
    State(state): State<AppState>,
    ActingParticipant(user): ActingParticipant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.message_service.delete(&id, &user).await?;
    Ok(StatusCode::OK)
}
