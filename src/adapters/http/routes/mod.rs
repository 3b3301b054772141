pub mod webhook;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/paddle", webhook::router())
}

/// GET /health
async fn health(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "paddle_mode": app_state.paddle_mode.as_str() }))
}
