//! HTTP server for the chat-history API
//!
//! A thin axum layer over the storage engine: routing, session
//! resolution, and the mapping from the error taxonomy onto status
//! codes. Page composition and all other portal surfaces live outside
//! this crate and consume these endpoints.

pub mod auth;
pub mod handlers;

pub use auth::{SessionProvider, StaticSessionProvider};

use crate::error::BackchatError;
use crate::storage::SqliteStorage;
use anyhow::Context;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    /// The persistent chat store
    pub storage: Arc<SqliteStorage>,
    /// Resolves bearer tokens to owner ids
    pub sessions: Arc<dyn SessionProvider>,
    /// Page size used when the caller does not supply a limit
    pub default_limit: usize,
    /// Ceiling for the `limit` query parameter
    pub max_limit: usize,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/chats",
            get(handlers::list_chats).post(handlers::create_chat),
        )
        .route(
            "/chats/:id",
            get(handlers::get_chat).delete(handlers::delete_chat),
        )
        .route("/chats/:id/visibility", put(handlers::update_visibility))
        .with_state(state)
}

/// Serve the API until the process is stopped
pub async fn run(bind: &str, state: AppState) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!("listening on {}", bind);
    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

/// Map an error from the taxonomy onto an HTTP response
///
/// `BadRequest`, `Unauthorized`, and `NotFound` are surfaced to the
/// caller with their message; everything else is an internal error and
/// only logged server-side.
pub(crate) fn error_response(err: anyhow::Error) -> (StatusCode, String) {
    match err.downcast_ref::<BackchatError>() {
        Some(BackchatError::BadRequest(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
        Some(BackchatError::Unauthorized(msg)) => (StatusCode::UNAUTHORIZED, msg.clone()),
        Some(BackchatError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
        _ => {
            error!("request failed: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    }
}
