use axum::{
    Json,
    extract::{Path, State},
};

use lantern_types::api::RoomInfo;

use crate::state::AppState;

/// GET /api/room/{channel_id} — current subscriber snapshot, for checking
/// whether clients actually joined the channel they think they did.
pub async fn room_info(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Json<RoomInfo> {
    let sockets = state.dispatcher.subscribers(&channel_id).await;
    Json(RoomInfo {
        count: sockets.len(),
        channel_id,
        sockets,
    })
}
