use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use huddle_types::api::{Claims, CreateChannelRequest, SendMessageRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::validation::{self, PageQuery};

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateChannelRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = validation::channel_name(&req.name)?;
    let description = validation::description(req.description)?;

    let channel = blocking(move || {
        Ok(state
            .chat
            .channels
            .create(&name, description.as_deref(), &claims.sub)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn list_channels(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let channels = blocking(move || Ok(state.chat.channels.list_all()?)).await?;
    Ok(Json(channels))
}

pub async fn my_channels(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let channels =
        blocking(move || Ok(state.chat.members.list_channels_for_user(&claims.sub)?)).await?;
    Ok(Json(channels))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let channel = blocking(move || Ok(state.chat.channels.get(&channel_id)?)).await?;
    Ok(Json(channel))
}

pub async fn join_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let membership =
        blocking(move || Ok(state.chat.members.add_member(&channel_id, &claims.sub)?)).await?;

    info!(channel_id = %membership.channel_id, user_id = %membership.user_id, "Joined channel");
    Ok(Json(membership))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_id = claims.sub.clone();
    let cid = channel_id.clone();
    blocking(move || Ok(state.chat.members.remove_member(&cid, &user_id)?)).await?;

    info!(%channel_id, user_id = %claims.sub, "Left channel");
    Ok(StatusCode::OK)
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let request = validation::page_request(&query)?;

    let page = blocking(move || {
        Ok(state
            .chat
            .channel_messages
            .history(&channel_id, &claims.sub, request)?)
    })
    .await?;

    Ok(Json(page))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::message_content(&req.content)?;

    let message = blocking(move || {
        Ok(state
            .chat
            .channel_messages
            .send(&channel_id, &claims.sub, &req.content)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}
