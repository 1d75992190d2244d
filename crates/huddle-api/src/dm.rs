use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use huddle_chat::ChatError;
use huddle_types::api::{Claims, CreateDmRequest, SendMessageRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::validation::{self, PageQuery};

/// Open (or reopen) the conversation between the caller and a peer.
/// Repeated calls, from either side, return the same conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateDmRequest>,
) -> ApiResult<impl IntoResponse> {
    let peer = validation::peer_user_id(&req.peer_user_id)?;

    let conversation = blocking(move || {
        if state.db.get_user_by_id(&peer)?.is_none() {
            return Err(ApiError::NotFound(format!("User not found with id: {}", peer)));
        }
        Ok(state.chat.conversations.create_or_get(&claims.sub, &peer)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let conversations =
        blocking(move || Ok(state.chat.conversations.list_for_user(&claims.sub)?)).await?;
    Ok(Json(conversations))
}

/// Only the two participants can see a conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let conversation = blocking(move || {
        let conversation = state.chat.conversations.get_by_id(&conversation_id)?;
        if !conversation.has_participant(&claims.sub) {
            return Err(ChatError::unauthorized(
                "User is not a participant in this conversation",
            )
            .into());
        }
        Ok(conversation)
    })
    .await?;

    Ok(Json(conversation))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let request = validation::page_request(&query)?;

    let page = blocking(move || {
        Ok(state
            .chat
            .direct_messages
            .history(&conversation_id, &claims.sub, request)?)
    })
    .await?;

    Ok(Json(page))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::message_content(&req.content)?;

    let message = blocking(move || {
        Ok(state
            .chat
            .direct_messages
            .send(&conversation_id, &claims.sub, &req.content)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}
