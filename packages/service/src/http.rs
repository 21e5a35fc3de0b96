//! HTTP intake for clone requests
//!
//! The boundary adapter in front of the request bus: `POST
//! /v1/clone-requests` accepts a CloneRequest body, submits it, and replies
//! with the completion status once the whole clone finished (or failed).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fragmentforge_core::bus::RequestBus;
use fragmentforge_core::db::GraphStoreError;
use fragmentforge_core::models::{CloneReply, CloneRequest};
use fragmentforge_core::services::CloneError;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<dyn RequestBus>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/clone-requests", post(submit_clone))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn submit_clone(
    State(state): State<AppState>,
    Json(request): Json<CloneRequest>,
) -> Result<Json<CloneReply>, (StatusCode, Json<Value>)> {
    match state.bus.submit(request).await {
        Ok(reply) => Ok(Json(reply)),
        Err(error) => {
            warn!(%error, depth = error.depth(), "clone request rejected");
            Err((
                error_status(&error),
                Json(json!({ "error": error.to_string(), "depth": error.depth() })),
            ))
        }
    }
}

/// Map the clone failure taxonomy onto HTTP status codes.
fn error_status(error: &CloneError) -> StatusCode {
    match error {
        CloneError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        CloneError::NotFound { .. } => StatusCode::NOT_FOUND,
        CloneError::Store(GraphStoreError::NodeNotFound { .. }) => StatusCode::NOT_FOUND,
        CloneError::Store(GraphStoreError::DanglingReference { .. }) => StatusCode::CONFLICT,
        CloneError::Store(_) | CloneError::Transport { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CloneError::Aborted { .. } => StatusCode::BAD_GATEWAY,
    }
}
