//! Text chat endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::ApiError;
use crate::conversation::history_from_value;

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: serde_json::Value,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Reply to a text message
///
/// The `message` check runs before `history` is looked at.
async fn chat(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "rejected chat body");
        ApiError::BadRequest("Invalid request body")
    })?;

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or(ApiError::BadRequest("Message is required"))?;

    let history = history_from_value(request.history).map_err(|e| {
        tracing::debug!(error = %e, "rejected chat history");
        ApiError::BadRequest("Invalid history")
    })?;

    tracing::debug!(history_len = history.len(), "chat request");

    let reply = state.chat.reply(&history, &message).await.map_err(|e| {
        tracing::error!(error = %e, "error generating response");
        ApiError::Upstream("Failed to generate response")
    })?;

    Ok(Json(ChatResponse { reply }))
}
