use axum::{Json, extract::State, http::StatusCode};
use tracing::{error, info};

use lantern_store::policy;
use lantern_types::api::Submission;
use lantern_types::models::Message;

use crate::state::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// POST /api/send-msg — direct-send path for server-side or external
/// callers. Unlike the subscription path, failures here are surfaced:
/// 400 on validation, 500 on persistence.
pub async fn send_message(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<Message>, ErrorResponse> {
    let (channel_id, message) = policy::normalize(submission).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
    })?;

    let message = state.store.append(&channel_id, message).await.map_err(|e| {
        error!("send-msg failed to persist to {}: {}", channel_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal error" })),
        )
    })?;

    info!("[send-msg] broadcast to channel {}: {}", channel_id, message.message_id);
    state.dispatcher.broadcast_new(&channel_id, message.clone()).await;

    Ok(Json(message))
}
