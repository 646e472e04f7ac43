//! HTTP channel: REST endpoints that run turns synchronously.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error};

use crate::channels::InboundEvent;
use crate::turn::TurnDispatcher;

/// State shared across handlers.
#[derive(Clone)]
pub struct RouteState {
    pub dispatcher: Arc<TurnDispatcher>,
}

/// Replies produced by one turn.
#[derive(Debug, Serialize)]
pub struct TurnReply {
    pub messages: Vec<String>,
}

/// Build the router for the bot's REST surface.
pub fn bot_routes(dispatcher: Arc<TurnDispatcher>) -> Router {
    let state = RouteState { dispatcher };

    Router::new()
        .route("/health", get(health))
        .route("/api/messages", post(post_message))
        .route("/api/conversations/{id}", delete(reset_conversation))
        .route("/api/profiles/{user_id}", get(get_profile))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// Serve files under `dir` for any path no route matched; `/` maps to
/// `index.html`.
pub fn with_static_files(router: Router, dir: impl AsRef<std::path::Path>) -> Router {
    router.fallback_service(ServeDir::new(dir))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "details-bot"
    }))
}

async fn post_message(
    State(state): State<RouteState>,
    Json(event): Json<InboundEvent>,
) -> impl IntoResponse {
    debug!(conversation_id = %event.conversation_id, kind = %event.kind, "HTTP event received");
    let messages = state.dispatcher.respond(&event).await;
    Json(TurnReply { messages })
}

async fn reset_conversation(
    State(state): State<RouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.dispatcher.reset_conversation(&id).await {
        Ok(true) => (StatusCode::OK, Json(serde_json::json!({"status": "reset"}))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Conversation not found"})),
        ),
        Err(e) => {
            error!(conversation_id = %id, error = %e, "Conversation reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Reset failed"})),
            )
        }
    }
}

async fn get_profile(
    State(state): State<RouteState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.dispatcher.profiles().find(&user_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(serde_json::json!(profile))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Profile not found"})),
        ),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Profile lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Profile lookup failed"})),
            )
        }
    }
}
