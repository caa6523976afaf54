//! HTTP and websocket routes for the interview server.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

pub mod ws;

use crate::state::AppState;

/// Configure all API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/interview", get(ws::interview_websocket))
        .route("/admin/sessions", get(list_sessions))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "interview-server",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Snapshot of live sessions for operators.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sessions.snapshot().await)
}
