use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use lantern_types::models::Message;

use crate::state::AppState;

/// GET /api/history/{channel_id} — full ordered log as JSON. Unknown and
/// corrupt channels both answer an empty array; history never errors.
pub async fn get_history(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Json<Vec<Message>> {
    Json(state.store.read_all(&channel_id).await)
}

/// GET /api/get-logs/{channel_id} — the raw serialized log, as stored on
/// disk, for operators poking at a channel. 404 with an empty body when the
/// channel has no log yet.
pub async fn get_raw_log(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> impl IntoResponse {
    let content_type = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
    match state.store.read_raw(&channel_id).await {
        Some(raw) => (StatusCode::OK, content_type, raw),
        None => (StatusCode::NOT_FOUND, content_type, String::new()),
    }
}
