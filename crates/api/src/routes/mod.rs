use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;
use validator::Validate;

use matchroom_domain::chatroom::{Chatroom, MessageSummary, MessageType};
use matchroom_domain::exemption::Exemption;
use matchroom_domain::group::{FilterAttributes, Group};
use matchroom_domain::invitation::Invitation;
use matchroom_domain::user::UserRecord;
use matchroom_domain::util::uuid_v7_without_dashes;

use crate::middleware::{self as app_middleware, MakeRequestUuid, REQUEST_ID_HEADER};
use crate::{error::ApiError, observability, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/groups", post(create_group))
        .route("/v1/groups/:group_id", get(get_group))
        .route("/v1/groups/:group_id/seek", post(start_seeking))
        .route("/v1/exemptions", post(create_exemption))
        .route("/v1/invitations", post(create_invitation))
        .route("/v1/chatrooms/:chatroom_id", get(get_chatroom))
        .route("/v1/chatrooms/:chatroom_id/messages", post(post_message))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(app_middleware::track_metrics))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("unknown");
                info_span!(
                    "http",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::new(Duration::from_secs(15)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    #[validate(length(min = 1))]
    id: String,
    #[validate(length(min = 1))]
    nickname: String,
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validation::validated(payload)?;
    let user = UserRecord::new(payload.id, payload.nickname)?;
    let user = state.user_store.create(&user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateGroupRequest {
    #[serde(default)]
    id: Option<String>,
    #[validate(length(min = 1))]
    member_ids: Vec<String>,
    #[serde(flatten)]
    filters: FilterAttributes,
}

async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validation::validated(payload)?;
    let id = payload.id.unwrap_or_else(uuid_v7_without_dashes);
    let group = Group::new(id, payload.member_ids, payload.filters)?;
    let group = state.group_store.create(&group).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let snapshot = state.group_store.get(&group_id).await?;
    snapshot.doc.map(Json).ok_or(ApiError::NotFound)
}

/// Moves the group into the seeking pool. The matching pass itself runs in
/// the background off the resulting change event.
async fn start_seeking(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let snapshot = state.group_store.get(&group_id).await?;
    let Some(mut group) = snapshot.doc else {
        return Err(ApiError::NotFound);
    };
    group.start_seeking()?;
    let group = state.group_store.update(&group, snapshot.version).await?;
    Ok(Json(group))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateExemptionRequest {
    #[validate(length(min = 1))]
    exempter_id: String,
    #[validate(length(min = 1))]
    exempted_id: String,
}

async fn create_exemption(
    State(state): State<AppState>,
    Json(payload): Json<CreateExemptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validation::validated(payload)?;
    let exemption = Exemption::new(payload.exempter_id, payload.exempted_id)?;
    let exemption = state.exemption_store.create(&exemption).await?;
    Ok((StatusCode::CREATED, Json(exemption)))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateInvitationRequest {
    #[validate(length(min = 1))]
    to_user_id: String,
    #[validate(length(min = 1))]
    from_user_id: String,
    #[validate(length(min = 1))]
    group_id: String,
}

async fn create_invitation(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvitationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validation::validated(payload)?;
    let invitation = Invitation::new(payload.to_user_id, payload.from_user_id, payload.group_id)?;
    let invitation = state.invitation_store.create(&invitation).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

async fn get_chatroom(
    State(state): State<AppState>,
    Path(chatroom_id): Path<String>,
) -> Result<Json<Chatroom>, ApiError> {
    let snapshot = state.chatroom_store.get(&chatroom_id).await?;
    snapshot.doc.map(Json).ok_or(ApiError::NotFound)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PostMessageRequest {
    #[validate(length(min = 1))]
    sender_id: String,
    #[validate(length(min = 1))]
    sender_nickname: String,
    #[serde(default)]
    message_type: Option<MessageType>,
    #[serde(default)]
    content: String,
}

async fn post_message(
    State(state): State<AppState>,
    Path(chatroom_id): Path<String>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validation::validated(payload)?;
    let message = MessageSummary {
        sender_id: payload.sender_id,
        sender_nickname: payload.sender_nickname,
        message_type: payload.message_type.unwrap_or(MessageType::Text),
        content: payload.content,
    };
    let room = state.chatrooms.append_message(&chatroom_id, message).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics() -> impl IntoResponse {
    observability::render_metrics().unwrap_or_default()
}
