//! HTTP handlers for the chat-history API
//!
//! Handlers parse raw input into validated parameter structs at the
//! boundary, hand the work to the storage layer, and map the error
//! taxonomy onto status codes. The authenticated owner always comes from
//! the session extractor, never from the request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::BackchatError;
use crate::pagination::{ChatPage, PageParams};
use crate::server::auth::AuthedOwner;
use crate::server::{error_response, AppState};
use crate::storage::{Chat, NewChat, Visibility};

/// Raw query parameters for the list endpoint
#[derive(Debug, Deserialize)]
pub struct ListChatsQuery {
    pub limit: Option<usize>,
    pub starting_after: Option<String>,
    pub ending_before: Option<String>,
}

/// Request body for creating a chat
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Request body for updating a chat's visibility
#[derive(Debug, Deserialize)]
pub struct UpdateVisibilityRequest {
    pub visibility: Visibility,
}

/// GET /chats
pub async fn list_chats(
    State(state): State<AppState>,
    AuthedOwner(owner): AuthedOwner,
    Query(query): Query<ListChatsQuery>,
) -> Result<Json<ChatPage>, (StatusCode, String)> {
    let params = PageParams::from_query(
        query.limit.or(Some(state.default_limit)),
        query.starting_after.as_deref(),
        query.ending_before.as_deref(),
        state.max_limit,
    )
    .map_err(error_response)?;

    let page = state
        .storage
        .list_page(&owner, &params)
        .map_err(error_response)?;

    metrics::increment_counter!("chat_pages_served_total");
    Ok(Json(page))
}

/// POST /chats
pub async fn create_chat(
    State(state): State<AppState>,
    AuthedOwner(owner): AuthedOwner,
    Json(request): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<Chat>), (StatusCode, String)> {
    if request.title.trim().is_empty() {
        return Err(error_response(
            BackchatError::BadRequest("title must not be empty".to_string()).into(),
        ));
    }

    let chat = state
        .storage
        .create_chat(&NewChat {
            owner_id: owner,
            title: request.title,
            visibility: request.visibility,
        })
        .map_err(error_response)?;

    info!("created chat {} for {}", chat.id, chat.owner_id);
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /chats/:id
pub async fn get_chat(
    State(state): State<AppState>,
    AuthedOwner(owner): AuthedOwner,
    Path(id): Path<String>,
) -> Result<Json<Chat>, (StatusCode, String)> {
    let chat = state
        .storage
        .get_owned_chat(&owner, &id)
        .map_err(error_response)?;

    Ok(Json(chat))
}

/// DELETE /chats/:id
pub async fn delete_chat(
    State(state): State<AppState>,
    AuthedOwner(owner): AuthedOwner,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .storage
        .delete_chat(&owner, &id)
        .map_err(error_response)?;

    info!("deleted chat {} for {}", id, owner);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /chats/:id/visibility
pub async fn update_visibility(
    State(state): State<AppState>,
    AuthedOwner(owner): AuthedOwner,
    Path(id): Path<String>,
    Json(request): Json<UpdateVisibilityRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .storage
        .update_visibility(&owner, &id, request.visibility)
        .map_err(error_response)?;

    info!(
        "visibility of chat {} set to {} by {}",
        id, request.visibility, owner
    );
    Ok(StatusCode::NO_CONTENT)
}
