pub mod auth;
pub mod channels;
pub mod dm;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod validation;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing::error;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, ApiResult};

/// Every route of the HTTP API. Transport layers (CORS, tracing) are added
/// by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/channels",
            post(channels::create_channel).get(channels::list_channels),
        )
        .route("/api/channels/mine", get(channels::my_channels))
        .route("/api/channels/{channel_id}", get(channels::get_channel))
        .route("/api/channels/{channel_id}/join", post(channels::join_channel))
        .route("/api/channels/{channel_id}/leave", post(channels::leave_channel))
        .route(
            "/api/channels/{channel_id}/messages",
            get(channels::get_messages).post(channels::send_message),
        )
        .route(
            "/api/dm/conversations",
            post(dm::create_conversation).get(dm::list_conversations),
        )
        .route("/api/dm/conversations/{conversation_id}", get(dm::get_conversation))
        .route(
            "/api/dm/conversations/{conversation_id}/messages",
            get(dm::get_messages).post(dm::send_message),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run blocking database work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
